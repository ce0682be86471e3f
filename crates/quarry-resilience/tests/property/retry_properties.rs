//! Property tests for the retry policy.

use std::time::Duration;

use proptest::prelude::*;
use quarry_core::config::RetryConfig;
use quarry_core::errors::ErrorCategory;
use quarry_resilience::RetryPolicy;

fn category() -> impl Strategy<Value = ErrorCategory> {
    prop_oneof![
        Just(ErrorCategory::Transient),
        Just(ErrorCategory::RateLimited),
        Just(ErrorCategory::Permanent),
        Just(ErrorCategory::CircuitOpen),
        Just(ErrorCategory::Timeout),
    ]
}

proptest! {
    #[test]
    fn never_retries_past_max_attempts(
        max_attempts in 1u32..8,
        attempt in 1u32..20,
        cat in category(),
        jitter in -0.2f64..0.2,
    ) {
        let policy = RetryPolicy::new(RetryConfig { max_attempts, ..RetryConfig::default() });
        let decision = policy.decide_with_jitter(attempt, cat, jitter);
        if attempt >= max_attempts {
            prop_assert!(!decision.retry);
        }
        if decision.retry {
            prop_assert!(cat.is_retryable());
        }
    }

    #[test]
    fn delay_is_capped_and_within_jitter_band(
        attempt in 1u32..3,
        jitter in -0.2f64..0.2,
        rate_limited in any::<bool>(),
    ) {
        let config = RetryConfig { max_attempts: 3, ..RetryConfig::default() };
        let policy = RetryPolicy::new(config.clone());
        let cat = if rate_limited { ErrorCategory::RateLimited } else { ErrorCategory::Transient };
        let base = if rate_limited { config.rate_limited_base_delay() } else { config.transient_base_delay() };

        let decision = policy.decide_with_jitter(attempt, cat, jitter);
        prop_assert!(decision.retry);
        prop_assert!(decision.delay <= config.max_delay());

        let nominal = base.as_millis() as f64 * 2f64.powi(attempt as i32 - 1);
        let lo = (nominal * 0.8).floor() as u64;
        let hi = ((nominal * 1.2).ceil() as u64).min(config.max_delay_ms);
        let got = decision.delay.as_millis() as u64;
        prop_assert!(got >= lo.min(hi) && got <= hi, "delay {got} outside [{lo}, {hi}]");
    }

    #[test]
    fn random_jitter_stays_bounded(attempt in 1u32..10) {
        let policy = RetryPolicy::new(RetryConfig { max_attempts: 10, max_delay_ms: 5_000, ..RetryConfig::default() });
        let decision = policy.decide(attempt, ErrorCategory::Transient);
        prop_assert!(decision.delay <= Duration::from_millis(5_000));
    }
}
