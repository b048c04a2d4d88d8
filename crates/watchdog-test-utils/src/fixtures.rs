//! Heartbeat fixtures.
//!
//! Direct SQL helpers for arranging and inspecting `cluster_heartbeats` rows
//! without going through the store under test.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

/// A row of `cluster_heartbeats` as seen by tests.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredHeartbeat {
    pub cluster_id: String,
    pub last_seen_at: DateTime<Utc>,
    pub alerting: bool,
}

/// Insert or overwrite a heartbeat row.
pub async fn seed_heartbeat(
    pool: &PgPool,
    cluster_id: &str,
    last_seen_at: DateTime<Utc>,
    alerting: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cluster_heartbeats (cluster_id, last_seen_at, alerting)
        VALUES ($1, $2, $3)
        ON CONFLICT (cluster_id) DO UPDATE SET
            last_seen_at = EXCLUDED.last_seen_at,
            alerting = EXCLUDED.alerting
        "#,
    )
    .bind(cluster_id)
    .bind(last_seen_at)
    .bind(alerting)
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed a cluster that last checked in `ago` before `now`.
pub async fn seed_silent_for(
    pool: &PgPool,
    cluster_id: &str,
    now: DateTime<Utc>,
    ago: Duration,
) -> Result<(), sqlx::Error> {
    seed_heartbeat(pool, cluster_id, now - ago, false).await
}

/// Read a heartbeat row, if present.
pub async fn fetch_heartbeat(
    pool: &PgPool,
    cluster_id: &str,
) -> Result<Option<StoredHeartbeat>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT cluster_id, last_seen_at, alerting
        FROM cluster_heartbeats
        WHERE cluster_id = $1
        "#,
    )
    .bind(cluster_id)
    .fetch_optional(pool)
    .await
}

/// Number of heartbeat rows.
pub async fn count_heartbeats(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cluster_heartbeats")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_seed_and_fetch(pool: PgPool) -> Result<(), anyhow::Error> {
        let now = Utc::now();
        seed_silent_for(&pool, "prod-eu", now, Duration::minutes(6)).await?;

        let row = fetch_heartbeat(&pool, "prod-eu").await?.expect("row seeded");
        assert_eq!(row.cluster_id, "prod-eu");
        assert!(!row.alerting);
        // TIMESTAMPTZ keeps microseconds.
        assert!((row.last_seen_at - (now - Duration::minutes(6))).num_milliseconds().abs() < 1);

        assert_eq!(count_heartbeats(&pool).await?, 1);
        assert!(fetch_heartbeat(&pool, "missing").await?.is_none());

        Ok(())
    }
}
