//! Individual relevance factors. Every factor returns a value in [0, 1];
//! factors without a signal return the neutral mid-value.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use quarry_core::constants::NEUTRAL_FACTOR;
use quarry_core::models::Candidate;
use quarry_core::text::tokenize;
use quarry_core::traits::IFeedbackSource;

/// Exponential decay with the given half-life. Undated documents are neutral;
/// future-dated documents count as brand new.
pub fn recency(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    let Some(ts) = updated_at else {
        return NEUTRAL_FACTOR;
    };
    let age_days = (now - ts).num_seconds().max(0) as f64 / 86_400.0;
    0.5f64.powf(age_days / half_life_days).clamp(0.0, 1.0)
}

/// Trust tier as a number in [0, 1] or a named tier.
pub fn authority(candidate: &Candidate) -> f64 {
    match candidate.trust_tier() {
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(NEUTRAL_FACTOR),
        Some(serde_json::Value::String(s)) => tier_weight(s),
        _ => NEUTRAL_FACTOR,
    }
}

fn tier_weight(tier: &str) -> f64 {
    match tier.trim().to_lowercase().as_str() {
        "official" | "authoritative" => 1.0,
        "verified" => 0.8,
        "internal" => 0.7,
        "community" => 0.4,
        "unverified" => 0.2,
        _ => NEUTRAL_FACTOR,
    }
}

/// Fraction of the query's context tags found among the document's tags.
/// Neutral when either side has no tags.
pub fn context_relevance(context_tags: &BTreeSet<String>, candidate: &Candidate) -> f64 {
    if context_tags.is_empty() {
        return NEUTRAL_FACTOR;
    }
    let doc_tags: HashSet<String> = candidate.tags().into_iter().collect();
    if doc_tags.is_empty() {
        return NEUTRAL_FACTOR;
    }
    let hits = context_tags.iter().filter(|t| doc_tags.contains(*t)).count();
    hits as f64 / context_tags.len() as f64
}

/// Fraction of distinct query terms present in the content.
pub fn keyword_match(query_terms: &HashSet<String>, content: &str) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_terms: HashSet<String> = tokenize(content).into_iter().collect();
    let hits = query_terms.iter().filter(|t| content_terms.contains(*t)).count();
    hits as f64 / query_terms.len() as f64
}

pub fn user_feedback(feedback: &dyn IFeedbackSource, document_id: &str) -> f64 {
    feedback
        .feedback_ratio(document_id)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 1.0))
        .unwrap_or(NEUTRAL_FACTOR)
}
