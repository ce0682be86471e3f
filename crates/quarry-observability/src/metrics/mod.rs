//! Metric event storage and aggregation.
//!
//! [`MetricsStore`] is an append-only event log shared by every backend call;
//! [`TimeRange`] selects the window a snapshot aggregates over.

mod reading;
mod store;
mod time_range;

pub use reading::MetricsReading;
pub use store::MetricsStore;
pub use time_range::TimeRange;
