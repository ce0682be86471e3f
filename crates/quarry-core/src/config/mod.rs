pub mod backends_config;
pub mod cache_config;
pub mod circuit_breaker_config;
pub mod defaults;
pub mod metrics_config;
pub mod observability_config;
pub mod orchestrator_config;
pub mod retry_config;
pub mod scoring_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use backends_config::{BackendsConfig, HostedIndexConfig, InMemoryConfig, RelationalVectorConfig};
pub use cache_config::CacheConfig;
pub use circuit_breaker_config::CircuitBreakerConfig;
pub use metrics_config::MetricsConfig;
pub use observability_config::ObservabilityConfig;
pub use orchestrator_config::OrchestratorConfig;
pub use retry_config::RetryConfig;
pub use scoring_config::{ScorerWeights, ScoringConfig, WeightOverrides};

use crate::constants::{ENV_PREFIX, HOSTED_INDEX_API_KEY_ENV};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub orchestrator: OrchestratorConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub metrics: MetricsConfig,
    pub backends: BackendsConfig,
    pub observability: ObservabilityConfig,
}

impl QuarryConfig {
    /// Parse from a TOML string. Missing sections take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, apply `QUARRY_*` environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(HOSTED_INDEX_API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.backends.hosted_index.api_key = Some(key);
        }
        if let Some(url) = lookup(&format!("{ENV_PREFIX}HOSTED_INDEX_BASE_URL")) {
            self.backends.hosted_index.base_url = url;
        }
        if let Some(store) = lookup(&format!("{ENV_PREFIX}HOSTED_INDEX_STORE_ID")) {
            self.backends.hosted_index.store_id = store;
        }
        if let Some(path) = lookup(&format!("{ENV_PREFIX}VECTOR_DB_PATH")) {
            self.backends.relational_vector.db_path = path;
        }
        if let Some(level) = lookup(&format!("{ENV_PREFIX}LOG_LEVEL")) {
            self.observability.log_level = level;
        }
    }

    /// Range checks across all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.retry.jitter_fraction) {
            return Err(ConfigError::invalid(
                "retry.jitter_fraction",
                "must be in [0, 1)",
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::invalid(
                "circuit_breaker.failure_threshold",
                "must be at least 1",
            ));
        }
        if self.circuit_breaker.cooldown_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "circuit_breaker.cooldown_multiplier",
                "must be >= 1.0",
            ));
        }
        if self.circuit_breaker.max_cooldown_secs < self.circuit_breaker.cooldown_secs {
            return Err(ConfigError::invalid(
                "circuit_breaker.max_cooldown_secs",
                "must be >= cooldown_secs",
            ));
        }
        if self.orchestrator.fanout_deadline_ms == 0 {
            return Err(ConfigError::invalid(
                "orchestrator.fanout_deadline_ms",
                "must be positive",
            ));
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::invalid("cache.ttl_secs", "must be positive"));
        }
        self.scoring.weights.validate()?;
        if !(self.scoring.recency_half_life_days > 0.0) {
            return Err(ConfigError::invalid(
                "scoring.recency_half_life_days",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.scoring.near_duplicate_threshold) {
            return Err(ConfigError::invalid(
                "scoring.near_duplicate_threshold",
                "must be in [0, 1]",
            ));
        }
        if self.scoring.shingle_size == 0 {
            return Err(ConfigError::invalid("scoring.shingle_size", "must be at least 1"));
        }
        if self.metrics.retention_days <= 0 {
            return Err(ConfigError::invalid("metrics.retention_days", "must be positive"));
        }
        Ok(())
    }
}
