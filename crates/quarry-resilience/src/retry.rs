//! Retry decisions: bounded attempts, exponential backoff with jitter.
//!
//! `delay = base * 2^(attempt-1) * (1 + jitter)`, capped at `max_delay`,
//! where `jitter` is drawn from `[-jitter_fraction, jitter_fraction]`.

use std::time::Duration;

use quarry_core::config::RetryConfig;
use quarry_core::errors::ErrorCategory;
use rand::Rng;

/// Outcome of [`RetryPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    const STOP: RetryDecision = RetryDecision {
        retry: false,
        delay: Duration::ZERO,
    };
}

/// Stateless retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Maximum calls per invocation, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Decide whether to retry after `attempt` (1-based) failed with `category`.
    pub fn decide(&self, attempt: u32, category: ErrorCategory) -> RetryDecision {
        let j = self.config.jitter_fraction;
        let jitter = if j > 0.0 {
            rand::thread_rng().gen_range(-j..=j)
        } else {
            0.0
        };
        self.decide_with_jitter(attempt, category, jitter)
    }

    /// Deterministic core of [`decide`](Self::decide) with an explicit jitter sample.
    pub fn decide_with_jitter(&self, attempt: u32, category: ErrorCategory, jitter: f64) -> RetryDecision {
        if !category.is_retryable() || attempt == 0 || attempt >= self.config.max_attempts {
            return RetryDecision::STOP;
        }

        let base = match category {
            ErrorCategory::RateLimited => self.config.rate_limited_base_delay(),
            _ => self.config.transient_base_delay(),
        };
        let j = jitter.clamp(-self.config.jitter_fraction, self.config.jitter_fraction);
        let exponent = (attempt - 1).min(30) as i32;
        let raw_ms = base.as_millis() as f64 * 2f64.powi(exponent) * (1.0 + j);
        let capped_ms = raw_ms.clamp(0.0, self.config.max_delay().as_millis() as f64);

        RetryDecision {
            retry: true,
            delay: Duration::from_millis(capped_ms.round() as u64),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn permanent_never_retries() {
        for attempt in 1..5 {
            assert!(!policy().decide(attempt, ErrorCategory::Permanent).retry);
        }
    }

    #[test]
    fn local_categories_never_retry() {
        assert!(!policy().decide(1, ErrorCategory::CircuitOpen).retry);
        assert!(!policy().decide(1, ErrorCategory::Timeout).retry);
    }

    #[test]
    fn transient_backs_off_exponentially_without_jitter() {
        let p = policy();
        assert_eq!(
            p.decide_with_jitter(1, ErrorCategory::Transient, 0.0).delay,
            Duration::from_millis(200)
        );
        assert_eq!(
            p.decide_with_jitter(2, ErrorCategory::Transient, 0.0).delay,
            Duration::from_millis(400)
        );
        assert!(!p.decide_with_jitter(3, ErrorCategory::Transient, 0.0).retry);
    }

    #[test]
    fn rate_limited_uses_longer_base() {
        let p = policy();
        let t = p.decide_with_jitter(1, ErrorCategory::Transient, 0.0).delay;
        let r = p.decide_with_jitter(1, ErrorCategory::RateLimited, 0.0).delay;
        assert!(r > t);
        assert_eq!(r, Duration::from_millis(1_000));
    }

    #[test]
    fn delay_is_capped() {
        let p = RetryPolicy::new(RetryConfig {
            max_attempts: 20,
            max_delay_ms: 1_500,
            ..Default::default()
        });
        let d = p.decide_with_jitter(10, ErrorCategory::RateLimited, 0.2).delay;
        assert_eq!(d, Duration::from_millis(1_500));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let p = policy();
        for _ in 0..200 {
            let d = p.decide(2, ErrorCategory::Transient).delay.as_millis();
            assert!((320..=480).contains(&d), "delay {d}ms outside 400ms ± 20%");
        }
    }
}
