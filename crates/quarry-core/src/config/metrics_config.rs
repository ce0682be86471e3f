use serde::{Deserialize, Serialize};

use super::defaults;

/// Metrics store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Events older than this are pruned (days).
    pub retention_days: i64,
}

impl MetricsConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_days: defaults::DEFAULT_METRICS_RETENTION_DAYS,
        }
    }
}
