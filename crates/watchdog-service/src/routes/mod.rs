//! HTTP routes for the watchdog server.
//!
//! Defines the Axum router and application state.

use crate::config::ServerConfig;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::repositories::HeartbeatStore;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Heartbeat store (PostgreSQL in production).
    pub store: Arc<dyn HeartbeatStore>,

    /// Service configuration.
    pub config: ServerConfig,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK")
/// - `/ready` - Readiness probe (store ping)
/// - `/metrics` - Prometheus metrics endpoint
/// - `/api/v1/heartbeats/{cluster_id}` - Heartbeat ingest (token in query)
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route(
            "/api/v1/heartbeats/:cluster_id",
            post(handlers::record_heartbeat),
        )
        .route(
            "/api/v1/heartbeats",
            post(handlers::record_heartbeat_without_cluster),
        )
        .route(
            "/api/v1/heartbeats/",
            post(handlers::record_heartbeat_without_cluster),
        )
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
