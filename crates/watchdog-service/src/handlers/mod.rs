//! HTTP request handlers for the watchdog server.

pub mod health;
pub mod ingest;
pub mod metrics;

pub use health::{health_check, readiness_check};
pub use ingest::{record_heartbeat, record_heartbeat_without_cluster};
pub use metrics::metrics_handler;
