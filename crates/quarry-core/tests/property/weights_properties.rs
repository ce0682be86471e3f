//! Property tests for weight overrides and renormalization.

use proptest::prelude::*;
use quarry_core::config::{ScorerWeights, WeightOverrides};
use quarry_core::models::Factor;

fn override_value() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0f64..=1.0)
}

fn overrides() -> impl Strategy<Value = WeightOverrides> {
    (
        override_value(),
        override_value(),
        override_value(),
        override_value(),
        override_value(),
        override_value(),
        override_value(),
    )
        .prop_map(|(s, r, a, c, k, m, u)| WeightOverrides {
            similarity: s,
            recency: r,
            authority: a,
            context_relevance: c,
            keyword_match: k,
            semantic_match: m,
            user_feedback: u,
        })
}

proptest! {
    #[test]
    fn overridden_weights_always_sum_to_one(o in overrides(), semantic in any::<bool>()) {
        let weights = ScorerWeights::default().with_overrides(&o).unwrap();
        let effective = weights.effective(semantic);
        prop_assert!((effective.sum() - 1.0).abs() < 1e-9);
        for factor in Factor::ALL {
            let w = effective.get(factor);
            prop_assert!((0.0..=1.0).contains(&w));
        }
        if !semantic {
            prop_assert_eq!(effective.get(Factor::SemanticMatch), 0.0);
        }
    }

    #[test]
    fn out_of_range_overrides_are_rejected(bad in prop_oneof![-10.0f64..-0.001, 1.001f64..10.0]) {
        let o = WeightOverrides { recency: Some(bad), ..WeightOverrides::default() };
        prop_assert!(ScorerWeights::default().with_overrides(&o).is_err());
    }
}
