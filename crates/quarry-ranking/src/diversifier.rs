//! Greedy near-duplicate filter over a rank-ordered list.
//!
//! Walks the list once and keeps a candidate unless its token-shingle
//! Jaccard similarity with an already-kept candidate exceeds the threshold,
//! regardless of which backend either came from. Rejected candidates are
//! dropped, not merged. Stops once `limit` candidates are kept.

use std::collections::HashSet;

use quarry_core::config::ScoringConfig;
use quarry_core::models::ScoredCandidate;
use quarry_core::text::{fnv1a, tokenize};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Diversifier {
    threshold: f64,
    shingle_size: usize,
}

impl Diversifier {
    pub fn new(threshold: f64, shingle_size: usize) -> Self {
        Self {
            threshold,
            shingle_size: shingle_size.max(1),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.near_duplicate_threshold, config.shingle_size)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Hashed token shingles. Texts shorter than one shingle form a single shingle.
    pub fn shingles(&self, text: &str) -> HashSet<u64> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return HashSet::new();
        }
        if tokens.len() < self.shingle_size {
            return HashSet::from([fnv1a(&tokens.join(" "))]);
        }
        tokens
            .windows(self.shingle_size)
            .map(|w| fnv1a(&w.join(" ")))
            .collect()
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        jaccard(&self.shingles(a), &self.shingles(b))
    }

    pub fn diversify(&self, ranked: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
        let mut kept: Vec<ScoredCandidate> = Vec::with_capacity(limit.min(ranked.len()));
        let mut kept_shingles: Vec<HashSet<u64>> = Vec::with_capacity(kept.capacity());
        let mut dropped = 0usize;

        for candidate in ranked {
            if kept.len() >= limit {
                break;
            }
            let shingles = self.shingles(&candidate.candidate.content);
            let duplicate = kept_shingles
                .iter()
                .any(|other| jaccard(&shingles, other) > self.threshold);
            if duplicate {
                dropped += 1;
                continue;
            }
            kept_shingles.push(shingles);
            kept.push(candidate);
        }

        if dropped > 0 {
            debug!(dropped, kept = kept.len(), "near-duplicates removed");
        }
        kept
    }
}

/// |A ∩ B| / |A ∪ B|; two empty sets are identical.
pub fn jaccard(a: &HashSet<u64>, b: &HashSet<u64>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}
