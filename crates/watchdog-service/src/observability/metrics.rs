//! Metrics definitions for the watchdog.
//!
//! All metrics follow Prometheus naming conventions:
//! - `watchdog_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max
//! - `endpoint`: normalized paths (cluster ids are never used as labels)
//! - `status`: success, error, timeout
//! - `operation`: bounded by repository methods
//! - `kind`: stale, recovered

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("watchdog_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("watchdog_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `watchdog_http_requests_total`, `watchdog_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("watchdog_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("watchdog_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path so cluster ids never become label values.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/heartbeats" | "/api/v1/heartbeats/" => "/api/v1/heartbeats",
        p if p.starts_with("/api/v1/heartbeats/") => "/api/v1/heartbeats/{cluster_id}",
        _ => "/other",
    }
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Record a heartbeat store query.
///
/// Metric: `watchdog_db_queries_total`, `watchdog_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("watchdog_db_query_duration_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("watchdog_db_queries_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Domain Metrics
// ============================================================================

/// Record an ingest attempt.
///
/// Metric: `watchdog_heartbeats_total`
/// Labels: `outcome` (accepted, unauthorized, missing_cluster_id, store_unavailable, error)
pub fn record_heartbeat(outcome: &'static str) {
    counter!("watchdog_heartbeats_total", "outcome" => outcome).increment(1);
}

/// Record the end of a checker sweep.
///
/// Metric: `watchdog_check_runs_total`, `watchdog_stale_clusters`
pub fn record_check_run(status: &'static str, stale_count: usize) {
    counter!("watchdog_check_runs_total", "status" => status).increment(1);
    gauge!("watchdog_stale_clusters").set(stale_count as f64);
}

/// Record a notification delivery attempt.
///
/// Metric: `watchdog_notifications_total`
/// Labels: `kind` (stale, recovered), `status` (delivered, failed)
pub fn record_notification(kind: &'static str, status: &'static str) {
    counter!("watchdog_notifications_total",
        "kind" => kind,
        "status" => status
    )
    .increment(1);
}
