//! # Watchdog Test Utilities
//!
//! Shared test utilities for the watchdog service.
//!
//! This crate provides:
//! - Server test harness (`TestWatchdogServer` for E2E tests)
//! - Heartbeat fixtures (seed and read `cluster_heartbeats` rows directly)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use watchdog_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let server = TestWatchdogServer::spawn(pool).await?;
//!
//!     let response = reqwest::Client::new()
//!         .post(server.heartbeat_url("prod-eu", TEST_VERIFY_TOKEN))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use fixtures::*;
pub use server_harness::*;
