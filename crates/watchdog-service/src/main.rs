//! Watchdog Service
//!
//! HTTP server receiving cluster heartbeats from AlertManager.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use watchdog_service::config::ServerConfig;
use watchdog_service::observability::{self, metrics};
use watchdog_service::repositories::PgHeartbeatStore;
use watchdog_service::routes::{self, AppState};

/// Default drain period after a shutdown signal.
const DEFAULT_DRAIN_SECONDS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing();

    info!("Starting Watchdog Service");

    let config = ServerConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        environment = config.environment_name.as_deref().unwrap_or("unset"),
        db_max_connections = config.db_max_connections,
        "Configuration loaded successfully"
    );

    let metrics_handle = metrics::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    info!("Connecting to database...");
    let db_url_with_timeout = add_query_timeout(&config.database_url, 5);
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_url_with_timeout)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Database connection established");

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState {
        store: Arc::new(PgHeartbeatStore::new(db_pool)),
        config,
    });

    let app = routes::build_routes(state, metrics_handle);

    info!("Watchdog Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Watchdog Service shutdown complete");

    Ok(())
}

/// Waits for SIGINT or SIGTERM, then holds the server open for the drain
/// period so in-flight heartbeats can finish.
async fn shutdown_signal() {
    let received = wait_for_signal().await;
    info!(signal = received, "Shutdown signal received");

    let drain = drain_period(std::env::var("WATCHDOG_DRAIN_SECONDS").ok().as_deref());
    if drain.is_zero() {
        info!("Shutting down without a drain period");
        return;
    }

    warn!(drain_secs = drain.as_secs(), "Draining in-flight requests");
    tokio::time::sleep(drain).await;
}

/// Name of the first shutdown signal delivered to the process.
async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    }
}

/// Drain period from `WATCHDOG_DRAIN_SECONDS`; unset or unparsable values
/// fall back to the default.
fn drain_period(value: Option<&str>) -> Duration {
    let secs = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_DRAIN_SECONDS);
    Duration::from_secs(secs)
}

/// Adds statement_timeout to the database URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}
