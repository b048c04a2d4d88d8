//! Heartbeat ingest.
//!
//! Validates a heartbeat (cluster id, then shared-secret token) and records
//! the arrival time. The store is never touched for a rejected request.

use crate::errors::WatchdogError;
use crate::models::HeartbeatRecord;
use crate::observability::metrics;
use crate::repositories::HeartbeatStore;
use chrono::{DateTime, Utc};
use ring::hmac;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

/// Fixed key for comparing tokens through HMAC tags. It is not secret; the
/// MAC only serves to get a constant-time comparison.
const TOKEN_COMPARISON_KEY: &[u8] = b"watchdog.verify_token.comparison";

/// Compare a presented token with the configured one in constant time.
pub fn verify_token(presented: Option<&str>, expected: &SecretString) -> bool {
    let Some(presented) = presented else {
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, TOKEN_COMPARISON_KEY);
    let expected_tag = hmac::sign(&key, expected.expose_secret().as_bytes());
    hmac::verify(&key, presented.as_bytes(), expected_tag.as_ref()).is_ok()
}

/// Validate and record one heartbeat.
///
/// Order of checks:
/// 1. `cluster_id` must be present and not blank (`MissingClusterId`)
/// 2. `query_token` must equal `expected_token` (`Unauthorized`)
/// 3. upsert `last_seen = now` (`StoreUnavailable` on failure)
///
/// Re-delivering the same heartbeat is harmless: the record is simply
/// overwritten with the same or a later time.
#[instrument(skip_all, fields(cluster_id = cluster_id.unwrap_or_default()))]
pub async fn handle_ingest(
    store: &dyn HeartbeatStore,
    cluster_id: Option<&str>,
    query_token: Option<&str>,
    expected_token: &SecretString,
    now: DateTime<Utc>,
) -> Result<HeartbeatRecord, WatchdogError> {
    let cluster_id = match cluster_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            warn!(target: "watchdog.ingest", "Rejected heartbeat without cluster id");
            metrics::record_heartbeat("missing_cluster_id");
            return Err(WatchdogError::MissingClusterId);
        }
    };

    if !verify_token(query_token, expected_token) {
        warn!(
            target: "watchdog.ingest",
            cluster_id = %cluster_id,
            token_present = query_token.is_some(),
            "Rejected heartbeat with invalid verification token"
        );
        metrics::record_heartbeat("unauthorized");
        return Err(WatchdogError::Unauthorized);
    }

    let record = match store.upsert_heartbeat(cluster_id, now).await {
        Ok(record) => record,
        Err(e) => {
            metrics::record_heartbeat("store_unavailable");
            return Err(e);
        }
    };
    metrics::record_heartbeat("accepted");

    info!(
        target: "watchdog.ingest",
        cluster_id = %record.cluster_id,
        epoch_seconds = record.last_seen.timestamp(),
        "Heartbeat recorded"
    );

    Ok(record)
}
