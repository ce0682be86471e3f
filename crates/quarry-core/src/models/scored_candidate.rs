use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Candidate;

/// Relevance factors combined by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Similarity,
    Recency,
    Authority,
    ContextRelevance,
    KeywordMatch,
    SemanticMatch,
    UserFeedback,
}

impl Factor {
    pub const ALL: [Factor; 7] = [
        Factor::Similarity,
        Factor::Recency,
        Factor::Authority,
        Factor::ContextRelevance,
        Factor::KeywordMatch,
        Factor::SemanticMatch,
        Factor::UserFeedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Recency => "recency",
            Self::Authority => "authority",
            Self::ContextRelevance => "context_relevance",
            Self::KeywordMatch => "keyword_match",
            Self::SemanticMatch => "semantic_match",
            Self::UserFeedback => "user_feedback",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate with its composite relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Composite score in [0.0, 1.0].
    pub relevance_score: f64,
    /// Per-factor values in [0.0, 1.0], before weighting.
    pub score_breakdown: BTreeMap<Factor, f64>,
}

impl ScoredCandidate {
    /// The similarity factor, used as the first tie-breaker.
    pub fn similarity(&self) -> f64 {
        self.score_breakdown
            .get(&Factor::Similarity)
            .copied()
            .unwrap_or(0.0)
    }
}
