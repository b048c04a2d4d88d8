//! Repository layer for the watchdog.
//!
//! The heartbeat store is reached through the [`HeartbeatStore`] trait so the
//! ingest and checker logic can run against PostgreSQL in production and an
//! in-memory fake in tests.

pub mod heartbeats;
pub mod mock;

use crate::errors::WatchdogError;
use crate::models::HeartbeatRecord;
use chrono::{DateTime, Utc};

pub use heartbeats::PgHeartbeatStore;
pub use mock::MockHeartbeatStore;

/// Durable mapping from cluster id to its last heartbeat.
///
/// Implementations must make `upsert_heartbeat` atomic per key. No
/// multi-key transactions are required.
#[async_trait::async_trait]
pub trait HeartbeatStore: Send + Sync {
    /// Insert or overwrite the last-seen time for a cluster.
    ///
    /// Leaves the `alerting` flag of an existing record untouched and returns
    /// the stored record.
    async fn upsert_heartbeat(
        &self,
        cluster_id: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<HeartbeatRecord, WatchdogError>;

    /// Read every record, ordered by cluster id.
    async fn list_heartbeats(&self) -> Result<Vec<HeartbeatRecord>, WatchdogError>;

    /// Set the alerting flag for a cluster. Unknown clusters are ignored.
    async fn set_alerting(&self, cluster_id: &str, alerting: bool) -> Result<(), WatchdogError>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), WatchdogError>;
}
