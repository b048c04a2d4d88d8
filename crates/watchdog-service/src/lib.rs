//! Cluster Watchdog Service Library
//!
//! A dead man's switch for cluster monitoring. Each monitored cluster's
//! AlertManager sends an always-firing "Watchdog" alert to the ingest
//! endpoint; a periodically started checker reports clusters whose heartbeat
//! has gone quiet, because a broken monitoring stack cannot alert about
//! itself.
//!
//! # Architecture
//!
//! Handler -> Service -> Repository, as two binaries over one library:
//!
//! ```text
//! watchdog-service: routes/mod.rs -> handlers/*.rs -> services/ingest.rs -> repositories/*.rs
//! watchdog-checker: services/staleness.rs -> repositories/*.rs + services/notifier.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Server and checker configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Tracing setup and metrics
//! - `repositories` - Heartbeat store trait, PostgreSQL and in-memory stores
//! - `routes` - Axum router setup
//! - `services` - Ingest, staleness checking, notification delivery

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
