//! PostgreSQL heartbeat store tests.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use watchdog_service::repositories::{HeartbeatStore, PgHeartbeatStore};
use watchdog_test_utils::{fetch_heartbeat, seed_heartbeat};

#[sqlx::test(migrations = "../../migrations")]
async fn test_upsert_creates_record(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());
    let now = Utc::now();

    let record = store.upsert_heartbeat("prod-eu", now).await?;

    assert_eq!(record.cluster_id, "prod-eu");
    assert_eq!(record.last_seen.timestamp_micros(), now.timestamp_micros());
    assert!(!record.alerting);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upsert_overwrites_even_with_older_time(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());
    let now = Utc::now();

    store.upsert_heartbeat("prod-eu", now).await?;
    // Out-of-order delivery is accepted as-is: last write wins.
    let record = store
        .upsert_heartbeat("prod-eu", now - Duration::minutes(1))
        .await?;

    assert_eq!(
        record.last_seen.timestamp_micros(),
        (now - Duration::minutes(1)).timestamp_micros()
    );
    assert_eq!(store.list_heartbeats().await?.len(), 1);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upsert_keeps_alerting_flag(pool: PgPool) -> Result<(), anyhow::Error> {
    seed_heartbeat(&pool, "prod-eu", Utc::now() - Duration::hours(1), true).await?;
    let store = PgHeartbeatStore::new(pool.clone());

    let record = store.upsert_heartbeat("prod-eu", Utc::now()).await?;

    assert!(record.alerting);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_heartbeats_ordered(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());
    let now = Utc::now();
    for id in ["zeta", "Alpha", "alpha"] {
        store.upsert_heartbeat(id, now).await?;
    }

    let records = store.list_heartbeats().await?;

    // Case-sensitive ids are distinct records.
    assert_eq!(records.len(), 3);
    let ids: Vec<&str> = records.iter().map(|r| r.cluster_id.as_str()).collect();
    assert!(ids.contains(&"Alpha") && ids.contains(&"alpha") && ids.contains(&"zeta"));

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_set_alerting(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());
    store.upsert_heartbeat("prod-eu", Utc::now()).await?;

    store.set_alerting("prod-eu", true).await?;
    let row = fetch_heartbeat(&pool, "prod-eu")
        .await?
        .ok_or_else(|| anyhow::anyhow!("row missing"))?;
    assert!(row.alerting);

    store.set_alerting("prod-eu", false).await?;
    let row = fetch_heartbeat(&pool, "prod-eu")
        .await?
        .ok_or_else(|| anyhow::anyhow!("row missing"))?;
    assert!(!row.alerting);

    // Unknown clusters are ignored.
    store.set_alerting("ghost", true).await?;
    assert!(fetch_heartbeat(&pool, "ghost").await?.is_none());

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_empty_cluster_id_rejected_by_schema(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());

    let result = store.upsert_heartbeat("", Utc::now()).await;

    assert!(result.is_err());

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ping(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool);

    store.ping().await?;

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_closed_pool_is_store_unavailable(pool: PgPool) -> Result<(), anyhow::Error> {
    let store = PgHeartbeatStore::new(pool.clone());
    pool.close().await;

    let result = store.list_heartbeats().await;

    assert!(matches!(
        result,
        Err(watchdog_service::errors::WatchdogError::StoreUnavailable(_))
    ));

    Ok(())
}
