use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum calls per invocation, including the first.
    pub max_attempts: u32,
    /// Base delay for transient failures (milliseconds).
    pub transient_base_delay_ms: u64,
    /// Base delay for rate-limited failures (milliseconds).
    pub rate_limited_base_delay_ms: u64,
    /// Cap applied after jitter (milliseconds).
    pub max_delay_ms: u64,
    /// Symmetric jitter fraction in [0, 1).
    pub jitter_fraction: f64,
}

impl RetryConfig {
    pub fn transient_base_delay(&self) -> Duration {
        Duration::from_millis(self.transient_base_delay_ms)
    }

    pub fn rate_limited_base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limited_base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            transient_base_delay_ms: defaults::DEFAULT_TRANSIENT_BASE_DELAY_MS,
            rate_limited_base_delay_ms: defaults::DEFAULT_RATE_LIMITED_BASE_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_MAX_RETRY_DELAY_MS,
            jitter_fraction: defaults::DEFAULT_JITTER_FRACTION,
        }
    }
}
