//! Per-request ranking switches.

use serde::{Deserialize, Serialize};

use quarry_core::config::{ScoringConfig, WeightOverrides};
use quarry_core::errors::ConfigError;
use quarry_ranking::ScoringOptions;

/// Caller-supplied overrides on top of the configured ranking behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub weights: WeightOverrides,
    /// Off → rank by normalized similarity only.
    pub enable_relevance_scoring: bool,
    /// `None` keeps the configured semantic setting.
    pub enable_cross_encoder: Option<bool>,
    pub enable_diversification: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            weights: WeightOverrides::default(),
            enable_relevance_scoring: true,
            enable_cross_encoder: None,
            enable_diversification: true,
        }
    }
}

impl SearchOptions {
    /// Resolve against the configured scoring section.
    pub fn scoring(&self, config: &ScoringConfig) -> Result<ScoringOptions, ConfigError> {
        let weights = if self.weights.is_empty() {
            config.weights
        } else {
            config.weights.with_overrides(&self.weights)?
        };
        Ok(ScoringOptions {
            weights,
            relevance_enabled: self.enable_relevance_scoring,
            semantic_enabled: self.enable_cross_encoder.unwrap_or(config.semantic_enabled),
        })
    }
}
