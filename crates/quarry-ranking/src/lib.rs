//! # quarry-ranking
//!
//! Turns merged backend candidates into an ordered result list:
//! per-backend similarity normalization, the 7-factor [`RelevanceScorer`],
//! deterministic ordering, and the greedy near-duplicate [`Diversifier`].

pub mod diversifier;
pub mod factors;
pub mod normalize;
pub mod scorer;
pub mod semantic;

pub use diversifier::Diversifier;
pub use scorer::{rank_order, RelevanceScorer, ScoringOptions};
pub use semantic::LexicalSemanticMatcher;
