//! # quarry-observability
//!
//! Per-backend metric events aggregated into `ServiceMetrics` snapshots,
//! health reporting over metrics and breaker state, and structured tracing
//! with span and event helpers.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::{BackendHealth, HealthReport, HealthReporter, HealthStatus};
pub use metrics::{MetricsReading, MetricsStore, TimeRange};
