use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCategory;

/// Breaker state name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of one backend's breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
    /// Always set while `status` is `Open`.
    pub opened_at: Option<DateTime<Utc>>,
    pub last_failure_category: Option<ErrorCategory>,
    /// Current cool-down before the next probe is allowed.
    pub cooldown_ms: u64,
}
