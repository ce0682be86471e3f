//! Multi-factor relevance scorer (7 factors).
//!
//! Factors: similarity, recency, authority, context relevance, keyword
//! match, semantic match, user feedback. The composite is the weighted sum
//! of factor values, clamped to [0, 1].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quarry_core::config::{ScorerWeights, ScoringConfig};
use quarry_core::models::{Candidate, Factor, Query, ScoredCandidate};
use quarry_core::text::tokenize;
use quarry_core::traits::{IFeedbackSource, ISemanticMatcher, NoFeedback};

use crate::factors;
use crate::normalize::normalize_similarity;

/// Per-request scoring switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringOptions {
    /// Weights before semantic gating and renormalization.
    pub weights: ScorerWeights,
    /// Off → rank by similarity alone.
    pub relevance_enabled: bool,
    /// Compute the semantic factor (requires a matcher).
    pub semantic_enabled: bool,
}

impl ScoringOptions {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            weights: config.weights,
            relevance_enabled: true,
            semantic_enabled: config.semantic_enabled,
        }
    }
}

pub struct RelevanceScorer {
    config: ScoringConfig,
    feedback: Arc<dyn IFeedbackSource>,
    semantic: Option<Arc<dyn ISemanticMatcher>>,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            feedback: Arc::new(NoFeedback),
            semantic: None,
        }
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn IFeedbackSource>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_semantic_matcher(mut self, matcher: Arc<dyn ISemanticMatcher>) -> Self {
        self.semantic = Some(matcher);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn default_options(&self) -> ScoringOptions {
        ScoringOptions::from_config(&self.config)
    }

    /// Weights actually applied under `options`; always sums to 1.0.
    pub fn effective_weights(&self, options: &ScoringOptions) -> ScorerWeights {
        if !options.relevance_enabled {
            return ScorerWeights::similarity_only();
        }
        let semantic_on = options.semantic_enabled && self.semantic.is_some();
        options.weights.effective(semantic_on)
    }

    /// Score every candidate and return them in rank order.
    pub fn score_all(
        &self,
        candidates: Vec<Candidate>,
        query: &Query,
        options: &ScoringOptions,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let weights = self.effective_weights(options);
        let similarity = normalize_similarity(&candidates);
        let query_terms: HashSet<String> = tokenize(&query.text).into_iter().collect();
        let context_tags = query
            .context
            .as_ref()
            .map(|c| c.context_tags())
            .unwrap_or_default();
        let semantic = self
            .semantic
            .as_ref()
            .filter(|_| weights.semantic_match > 0.0);

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .zip(similarity)
            .map(|(candidate, sim)| {
                let mut breakdown = BTreeMap::new();
                breakdown.insert(Factor::Similarity, sim.clamp(0.0, 1.0));
                breakdown.insert(
                    Factor::Recency,
                    factors::recency(
                        candidate.updated_at(),
                        now,
                        self.config.recency_half_life_days,
                    ),
                );
                breakdown.insert(Factor::Authority, factors::authority(&candidate));
                breakdown.insert(
                    Factor::ContextRelevance,
                    factors::context_relevance(&context_tags, &candidate),
                );
                breakdown.insert(
                    Factor::KeywordMatch,
                    factors::keyword_match(&query_terms, &candidate.content),
                );
                let semantic_value = semantic
                    .map(|m| m.score(&query.text, &candidate.content).clamp(0.0, 1.0))
                    .unwrap_or(0.0);
                breakdown.insert(Factor::SemanticMatch, semantic_value);
                breakdown.insert(
                    Factor::UserFeedback,
                    factors::user_feedback(self.feedback.as_ref(), &candidate.document_id),
                );

                let relevance: f64 = breakdown
                    .iter()
                    .map(|(factor, value)| weights.get(*factor) * value)
                    .sum();

                ScoredCandidate {
                    candidate,
                    relevance_score: relevance.clamp(0.0, 1.0),
                    score_breakdown: breakdown,
                }
            })
            .collect();

        scored.sort_by(rank_order);
        scored
    }
}

/// Rank order: relevance desc, similarity desc, most recent first,
/// document id asc, backend asc.
pub fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.similarity().total_cmp(&a.similarity()))
        .then_with(|| {
            // None sorts before Some, so reversing puts undated documents last.
            b.candidate.updated_at().cmp(&a.candidate.updated_at())
        })
        .then_with(|| a.candidate.document_id.cmp(&b.candidate.document_id))
        .then_with(|| a.candidate.backend.cmp(&b.candidate.backend))
}
