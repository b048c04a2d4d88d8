//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! Labels carry cluster-independent values only (normalized endpoints,
//! outcomes), so cardinality stays bounded.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text exposition format:
/// ```text
/// # TYPE watchdog_heartbeats_total counter
/// watchdog_heartbeats_total{outcome="accepted"} 42
/// ```
#[tracing::instrument(skip_all, name = "watchdog.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
