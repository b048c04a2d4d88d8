//! Service layer for the watchdog.
//!
//! Contains the domain logic for heartbeat ingest and staleness checking plus
//! the outbound notifier.

pub mod ingest;
pub mod notifier;
pub mod scale_schedule;
pub mod staleness;

pub use ingest::handle_ingest;
pub use notifier::{Notifier, SlackNotifier};
pub use scale_schedule::ScaleDownSchedule;
pub use staleness::{is_stale, StalenessChecker};
