//! PostgreSQL heartbeat store.
//!
//! Backs [`HeartbeatStore`] with the `cluster_heartbeats` table.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Cluster ids are logged, tokens never reach this layer

use crate::errors::WatchdogError;
use crate::models::HeartbeatRecord;
use crate::observability::metrics;
use crate::repositories::HeartbeatStore;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;

/// Heartbeat store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgHeartbeatStore {
    pool: PgPool,
}

impl PgHeartbeatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Database row representation for cluster heartbeats.
#[derive(sqlx::FromRow)]
struct HeartbeatRow {
    cluster_id: String,
    last_seen_at: DateTime<Utc>,
    alerting: bool,
}

impl From<HeartbeatRow> for HeartbeatRecord {
    fn from(row: HeartbeatRow) -> Self {
        Self {
            cluster_id: row.cluster_id,
            last_seen: row.last_seen_at,
            alerting: row.alerting,
        }
    }
}

fn query_status<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

#[async_trait::async_trait]
impl HeartbeatStore for PgHeartbeatStore {
    #[instrument(skip_all, fields(cluster_id = %cluster_id))]
    async fn upsert_heartbeat(
        &self,
        cluster_id: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<HeartbeatRecord, WatchdogError> {
        let start = Instant::now();

        // Single-statement upsert keeps same-key races atomic; arrival order wins.
        let query_result: Result<HeartbeatRow, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO cluster_heartbeats (cluster_id, last_seen_at)
            VALUES ($1, $2)
            ON CONFLICT (cluster_id) DO UPDATE SET
                last_seen_at = EXCLUDED.last_seen_at,
                updated_at = NOW()
            RETURNING cluster_id, last_seen_at, alerting
            "#,
        )
        .bind(cluster_id)
        .bind(seen_at)
        .fetch_one(&self.pool)
        .await;

        metrics::record_db_query("upsert_heartbeat", query_status(&query_result), start.elapsed());

        let record = HeartbeatRecord::from(query_result?);

        tracing::debug!(
            target: "watchdog.repository",
            cluster_id = %record.cluster_id,
            last_seen = %record.last_seen,
            "Heartbeat recorded"
        );

        Ok(record)
    }

    #[instrument(skip_all)]
    async fn list_heartbeats(&self) -> Result<Vec<HeartbeatRecord>, WatchdogError> {
        let start = Instant::now();

        let query_result: Result<Vec<HeartbeatRow>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT cluster_id, last_seen_at, alerting
            FROM cluster_heartbeats
            ORDER BY cluster_id
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        metrics::record_db_query("list_heartbeats", query_status(&query_result), start.elapsed());

        Ok(query_result?
            .into_iter()
            .map(HeartbeatRecord::from)
            .collect())
    }

    #[instrument(skip_all, fields(cluster_id = %cluster_id, alerting = alerting))]
    async fn set_alerting(&self, cluster_id: &str, alerting: bool) -> Result<(), WatchdogError> {
        let start = Instant::now();

        let query_result = sqlx::query(
            r#"
            UPDATE cluster_heartbeats
            SET alerting = $2, updated_at = NOW()
            WHERE cluster_id = $1
            "#,
        )
        .bind(cluster_id)
        .bind(alerting)
        .execute(&self.pool)
        .await;

        metrics::record_db_query("set_alerting", query_status(&query_result), start.elapsed());

        if query_result?.rows_affected() == 0 {
            tracing::warn!(
                target: "watchdog.repository",
                cluster_id = %cluster_id,
                "Alerting flag not updated: cluster not found"
            );
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), WatchdogError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
