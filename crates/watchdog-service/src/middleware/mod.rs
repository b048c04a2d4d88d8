//! Middleware for the watchdog server.
//!
//! - `http_metrics` - HTTP request metrics middleware

pub mod http_metrics;

pub use http_metrics::http_metrics_middleware;
