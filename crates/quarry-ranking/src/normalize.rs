//! Per-backend similarity normalization.
//!
//! Raw scores are on each backend's own scale, so each backend's candidates
//! in a request are min-max scaled among themselves. A backend that
//! contributed a single candidate (or all-equal scores) keeps its raw score
//! when it already lies in [0, 1], otherwise it is squashed with a logistic.

use std::collections::BTreeMap;

use quarry_core::models::{BackendKind, Candidate};

/// Normalized similarity for each candidate, index-aligned with `candidates`.
pub fn normalize_similarity(candidates: &[Candidate]) -> Vec<f64> {
    let mut ranges: BTreeMap<BackendKind, (f64, f64)> = BTreeMap::new();
    for c in candidates {
        let entry = ranges.entry(c.backend).or_insert((c.raw_score, c.raw_score));
        entry.0 = entry.0.min(c.raw_score);
        entry.1 = entry.1.max(c.raw_score);
    }

    candidates
        .iter()
        .map(|c| {
            let (lo, hi) = ranges[&c.backend];
            if hi - lo > f64::EPSILON {
                (c.raw_score - lo) / (hi - lo)
            } else {
                squash(c.raw_score)
            }
        })
        .collect()
}

/// Identity inside [0, 1], logistic outside.
pub fn squash(raw: f64) -> f64 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(backend: BackendKind, id: &str, raw: f64) -> Candidate {
        Candidate::new(backend, id, "s", raw, "text")
    }

    #[test]
    fn min_max_is_per_backend() {
        let cands = vec![
            c(BackendKind::HostedIndex, "a", 0.9),
            c(BackendKind::HostedIndex, "b", 0.5),
            c(BackendKind::HostedIndex, "c", 0.7),
            c(BackendKind::RelationalVector, "d", 12.0),
            c(BackendKind::RelationalVector, "e", 4.0),
        ];
        let n = normalize_similarity(&cands);
        assert!((n[0] - 1.0).abs() < 1e-9);
        assert!(n[1].abs() < 1e-9);
        assert!((n[2] - 0.5).abs() < 1e-9);
        assert!((n[3] - 1.0).abs() < 1e-9);
        assert!(n[4].abs() < 1e-9);
    }

    #[test]
    fn single_candidate_kept_or_squashed() {
        let n = normalize_similarity(&[c(BackendKind::InMemory, "a", 0.42)]);
        assert!((n[0] - 0.42).abs() < 1e-9);

        let n = normalize_similarity(&[c(BackendKind::InMemory, "a", 3.0)]);
        assert!(n[0] > 0.9 && n[0] < 1.0);
        let n = normalize_similarity(&[c(BackendKind::InMemory, "a", -3.0)]);
        assert!(n[0] > 0.0 && n[0] < 0.1);
    }
}
