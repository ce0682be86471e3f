use quarry_core::models::ServiceMetrics;
use serde::{Deserialize, Serialize};

/// Result of reading one backend's metrics.
///
/// `Unavailable` is distinct from a healthy reading with zero traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsReading {
    Available(ServiceMetrics),
    Unavailable { reason: String },
}

impl MetricsReading {
    pub fn metrics(&self) -> Option<&ServiceMetrics> {
        match self {
            Self::Available(m) => Some(m),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}
