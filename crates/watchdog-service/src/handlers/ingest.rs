//! Heartbeat ingest handlers.
//!
//! - `POST /api/v1/heartbeats/{cluster_id}?verify_token=...` - Record a heartbeat
//! - `POST /api/v1/heartbeats` - Rejected, cluster id missing
//!
//! AlertManager is configured with a webhook per cluster whose URL carries the
//! cluster id and the shared verification token. The request body (the
//! AlertManager payload) is ignored.
//!
//! # Security
//!
//! - The token is compared in constant time and never logged
//! - Error responses are generic JSON bodies

use crate::errors::WatchdogError;
use crate::models::{IngestQuery, IngestResponse};
use crate::routes::AppState;
use crate::services::ingest;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/heartbeats/{cluster_id}
///
/// # Response
///
/// - 200 OK: Heartbeat recorded
/// - 400 Bad Request: Blank cluster id
/// - 401 Unauthorized: Missing or wrong `verify_token`
/// - 503 Service Unavailable: Heartbeat store unreachable
#[instrument(
    skip_all,
    name = "watchdog.heartbeat.record",
    fields(method = "POST", endpoint = "/api/v1/heartbeats/{cluster_id}")
)]
pub async fn record_heartbeat(
    State(state): State<Arc<AppState>>,
    Path(cluster_id): Path<String>,
    Query(query): Query<IngestQuery>,
) -> Result<Json<IngestResponse>, WatchdogError> {
    let record = ingest::handle_ingest(
        state.store.as_ref(),
        Some(cluster_id.as_str()),
        query.verify_token.as_deref(),
        &state.config.verify_token,
        Utc::now(),
    )
    .await?;

    Ok(Json(IngestResponse::from(&record)))
}

/// Handler for POST /api/v1/heartbeats without a cluster id segment.
#[instrument(skip_all, name = "watchdog.heartbeat.record_without_cluster")]
pub async fn record_heartbeat_without_cluster(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngestQuery>,
) -> Result<Json<IngestResponse>, WatchdogError> {
    let record = ingest::handle_ingest(
        state.store.as_ref(),
        None,
        query.verify_token.as_deref(),
        &state.config.verify_token,
        Utc::now(),
    )
    .await?;

    Ok(Json(IngestResponse::from(&record)))
}
