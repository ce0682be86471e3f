use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BackendKind;
use crate::errors::ErrorCategory;

/// Kind of a recorded metric event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Latency,
    Success,
    Error,
    Retry,
    CircuitTrip,
    Fallback,
}

/// Append-only metric record. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub backend: BackendKind,
    pub kind: MetricKind,
    /// Milliseconds for `Latency`, 1.0 for counters.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    pub timestamp: DateTime<Utc>,
}

impl MetricEvent {
    pub fn new(backend: BackendKind, kind: MetricKind, value: f64) -> Self {
        Self {
            backend,
            kind,
            value,
            error_category: None,
            timestamp: Utc::now(),
        }
    }

    pub fn latency(backend: BackendKind, millis: f64) -> Self {
        Self::new(backend, MetricKind::Latency, millis)
    }

    pub fn success(backend: BackendKind) -> Self {
        Self::new(backend, MetricKind::Success, 1.0)
    }

    pub fn error(backend: BackendKind, category: ErrorCategory) -> Self {
        Self {
            error_category: Some(category),
            ..Self::new(backend, MetricKind::Error, 1.0)
        }
    }

    pub fn retry(backend: BackendKind, category: ErrorCategory) -> Self {
        Self {
            error_category: Some(category),
            ..Self::new(backend, MetricKind::Retry, 1.0)
        }
    }

    pub fn circuit_trip(backend: BackendKind) -> Self {
        Self::new(backend, MetricKind::CircuitTrip, 1.0)
    }

    pub fn fallback(backend: BackendKind) -> Self {
        Self::new(backend, MetricKind::Fallback, 1.0)
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
