//! Health reporting.
//!
//! [`HealthReporter`] combines per-backend metric readings and breaker
//! snapshots into a single [`HealthReport`].

mod reporter;

pub use reporter::{BackendHealth, HealthReport, HealthReporter, HealthStatus};
