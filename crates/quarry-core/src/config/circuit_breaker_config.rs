use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Circuit breaker configuration, shared by every backend's breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Failures further apart than this restart the count (seconds).
    pub failure_window_secs: u64,
    /// Base cool-down before a probe is allowed (seconds).
    pub cooldown_secs: u64,
    /// Cool-down growth after each failed probe.
    pub cooldown_multiplier: f64,
    /// Upper bound on the grown cool-down (seconds).
    pub max_cooldown_secs: u64,
}

impl CircuitBreakerConfig {
    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn max_cooldown(&self) -> Duration {
        Duration::from_secs(self.max_cooldown_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::DEFAULT_FAILURE_THRESHOLD,
            failure_window_secs: defaults::DEFAULT_FAILURE_WINDOW_SECS,
            cooldown_secs: defaults::DEFAULT_COOLDOWN_SECS,
            cooldown_multiplier: defaults::DEFAULT_COOLDOWN_MULTIPLIER,
            max_cooldown_secs: defaults::DEFAULT_MAX_COOLDOWN_SECS,
        }
    }
}
