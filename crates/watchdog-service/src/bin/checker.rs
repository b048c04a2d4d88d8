//! Watchdog Checker
//!
//! Performs a single staleness sweep and exits. Meant to be started by an
//! external scheduler (e.g. a Kubernetes CronJob every few minutes).
//!
//! Exit status is non-zero when configuration is invalid or the heartbeat
//! store cannot be read. Failed notification deliveries are logged and do not
//! change the exit status.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use watchdog_service::config::CheckerConfig;
use watchdog_service::observability;
use watchdog_service::repositories::PgHeartbeatStore;
use watchdog_service::services::{SlackNotifier, StalenessChecker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing();

    let config = CheckerConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        channel = %config.slack_channel,
        threshold_secs = config.staleness_threshold.as_secs(),
        environment = config.environment_name.as_deref().unwrap_or("unset"),
        scale_down = config.scale_down.is_some(),
        "Starting staleness check"
    );

    let notifier = SlackNotifier::new(config.slack_api_url.clone(), config.slack_token.clone())
        .map_err(|e| {
            error!("Failed to build Slack client: {}", e);
            e
        })?;

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    let checker = StalenessChecker::new(
        Arc::new(PgHeartbeatStore::new(db_pool.clone())),
        Arc::new(notifier),
        config.slack_channel.clone(),
    )
    .with_environment_name(config.environment_name.clone())
    .with_scale_down(config.scale_down.clone());

    let result = checker
        .run_check(Utc::now(), config.staleness_threshold)
        .await
        .map_err(|e| {
            error!("Staleness check aborted: {}", e);
            e
        });

    db_pool.close().await;

    let result = result?;

    if !result.all_delivered() {
        warn!(
            failed = result.failed_notifications().count(),
            "Some notifications were not delivered"
        );
    }

    info!(
        checked = result.checked,
        stale = result.stale.len(),
        skipped = result.skipped.len(),
        "Staleness check finished"
    );

    Ok(())
}
