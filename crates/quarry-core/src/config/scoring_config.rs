use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::WEIGHT_SUM_TOLERANCE;
use crate::errors::ConfigError;
use crate::models::Factor;

/// Weights for the 7 relevance factors. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerWeights {
    pub similarity: f64,
    pub recency: f64,
    pub authority: f64,
    pub context_relevance: f64,
    pub keyword_match: f64,
    pub semantic_match: f64,
    pub user_feedback: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            similarity: defaults::DEFAULT_WEIGHT_SIMILARITY,
            recency: defaults::DEFAULT_WEIGHT_RECENCY,
            authority: defaults::DEFAULT_WEIGHT_AUTHORITY,
            context_relevance: defaults::DEFAULT_WEIGHT_CONTEXT_RELEVANCE,
            keyword_match: defaults::DEFAULT_WEIGHT_KEYWORD_MATCH,
            semantic_match: defaults::DEFAULT_WEIGHT_SEMANTIC_MATCH,
            user_feedback: defaults::DEFAULT_WEIGHT_USER_FEEDBACK,
        }
    }
}

impl ScorerWeights {
    /// Rank by the similarity factor alone.
    pub fn similarity_only() -> Self {
        Self {
            similarity: 1.0,
            recency: 0.0,
            authority: 0.0,
            context_relevance: 0.0,
            keyword_match: 0.0,
            semantic_match: 0.0,
            user_feedback: 0.0,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Similarity => self.similarity,
            Factor::Recency => self.recency,
            Factor::Authority => self.authority,
            Factor::ContextRelevance => self.context_relevance,
            Factor::KeywordMatch => self.keyword_match,
            Factor::SemanticMatch => self.semantic_match,
            Factor::UserFeedback => self.user_feedback,
        }
    }

    pub fn set(&mut self, factor: Factor, weight: f64) {
        let slot = match factor {
            Factor::Similarity => &mut self.similarity,
            Factor::Recency => &mut self.recency,
            Factor::Authority => &mut self.authority,
            Factor::ContextRelevance => &mut self.context_relevance,
            Factor::KeywordMatch => &mut self.keyword_match,
            Factor::SemanticMatch => &mut self.semantic_match,
            Factor::UserFeedback => &mut self.user_feedback,
        };
        *slot = weight;
    }

    pub fn sum(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.get(*f)).sum()
    }

    /// Check each weight is in [0, 1] and the total is 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for factor in Factor::ALL {
            let w = self.get(factor);
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(ConfigError::invalid(
                    &format!("scoring.weights.{factor}"),
                    format!("must be in [0, 1], got {w}"),
                ));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }

    /// Weights actually applied for one search.
    ///
    /// Disabled factors get weight 0 and every enabled weight is divided by
    /// the enabled total, so the result always sums to 1.0. An all-zero
    /// enabled set degrades to similarity-only.
    pub fn effective(&self, semantic_enabled: bool) -> ScorerWeights {
        let mut out = *self;
        if !semantic_enabled {
            out.semantic_match = 0.0;
        }
        out.renormalize();
        out
    }

    /// Apply caller overrides on top of these weights, then renormalize.
    pub fn with_overrides(&self, overrides: &WeightOverrides) -> Result<ScorerWeights, ConfigError> {
        let mut out = *self;
        for factor in Factor::ALL {
            if let Some(w) = overrides.get(factor) {
                if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                    return Err(ConfigError::invalid(
                        &format!("weights.{factor}"),
                        format!("override must be in [0, 1], got {w}"),
                    ));
                }
                out.set(factor, w);
            }
        }
        out.renormalize();
        Ok(out)
    }

    fn renormalize(&mut self) {
        let sum = self.sum();
        if sum <= f64::EPSILON {
            *self = ScorerWeights::similarity_only();
            return;
        }
        for factor in Factor::ALL {
            let w = self.get(factor);
            self.set(factor, w / sum);
        }
    }
}

/// Partial weight overrides supplied with a search request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOverrides {
    pub similarity: Option<f64>,
    pub recency: Option<f64>,
    pub authority: Option<f64>,
    pub context_relevance: Option<f64>,
    pub keyword_match: Option<f64>,
    pub semantic_match: Option<f64>,
    pub user_feedback: Option<f64>,
}

impl WeightOverrides {
    pub fn get(&self, factor: Factor) -> Option<f64> {
        match factor {
            Factor::Similarity => self.similarity,
            Factor::Recency => self.recency,
            Factor::Authority => self.authority,
            Factor::ContextRelevance => self.context_relevance,
            Factor::KeywordMatch => self.keyword_match,
            Factor::SemanticMatch => self.semantic_match,
            Factor::UserFeedback => self.user_feedback,
        }
    }

    pub fn is_empty(&self) -> bool {
        Factor::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// Relevance scoring and diversification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScorerWeights,
    /// Age at which the recency factor halves (days).
    pub recency_half_life_days: f64,
    /// Enable the (expensive) secondary semantic factor.
    pub semantic_enabled: bool,
    /// Token-shingle Jaccard similarity above which two results are near-duplicates.
    pub near_duplicate_threshold: f64,
    /// Tokens per shingle.
    pub shingle_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScorerWeights::default(),
            recency_half_life_days: defaults::DEFAULT_RECENCY_HALF_LIFE_DAYS,
            semantic_enabled: defaults::DEFAULT_SEMANTIC_ENABLED,
            near_duplicate_threshold: defaults::DEFAULT_NEAR_DUPLICATE_THRESHOLD,
            shingle_size: defaults::DEFAULT_SHINGLE_SIZE,
        }
    }
}
