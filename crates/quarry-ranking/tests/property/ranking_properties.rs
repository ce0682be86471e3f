//! Property tests for scoring and diversification.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use quarry_core::config::ScoringConfig;
use quarry_core::models::{BackendKind, Candidate, Query};
use quarry_ranking::{rank_order, Diversifier, RelevanceScorer};

const WORDS: &[&str] = &[
    "calibration", "steps", "torque", "gauge", "zero", "load", "record", "lab", "safety", "menu",
];

fn content() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..12).prop_map(|w| w.join(" "))
}

fn backend() -> impl Strategy<Value = BackendKind> {
    prop::sample::select(BackendKind::ALL.to_vec())
}

fn candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(
        (backend(), -5.0f64..5.0, content(), prop::option::of(0i64..2_000_000_000)),
        0..25,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (backend, raw, text, ts))| {
                let c = Candidate::new(backend, format!("doc-{i}"), "s", raw, text);
                match ts {
                    Some(secs) => c.with_metadata("updated_at", serde_json::json!(secs)),
                    None => c,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn scores_bounded_and_sorted(cands in candidates(), q in content()) {
        let scorer = RelevanceScorer::new(ScoringConfig::default());
        let now = Utc.timestamp_opt(2_100_000_000, 0).unwrap();
        let out = scorer.score_all(cands, &Query::new(q), &scorer.default_options(), now);
        for s in &out {
            prop_assert!((0.0..=1.0).contains(&s.relevance_score));
            for v in s.score_breakdown.values() {
                prop_assert!((0.0..=1.0).contains(v));
            }
        }
        for pair in out.windows(2) {
            prop_assert_ne!(rank_order(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn diversified_results_have_no_near_duplicates(
        cands in candidates(),
        threshold in 0.1f64..1.0,
        limit in 1usize..15,
    ) {
        let scorer = RelevanceScorer::new(ScoringConfig::default());
        let ranked = scorer.score_all(cands, &Query::new("calibration steps"), &scorer.default_options(), Utc::now());
        let d = Diversifier::new(threshold, 3);
        let out = d.diversify(ranked, limit);
        prop_assert!(out.len() <= limit);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                prop_assert!(d.similarity(&a.candidate.content, &b.candidate.content) <= threshold);
            }
        }
    }
}
