use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorCategory;

/// Aggregated view over retained metric events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Requests that needed at least one retry, not the number of retries.
    pub retried_requests: u64,
    pub circuit_breaker_trips: u64,
    pub fallback_activations: u64,
    pub average_latency_ms: f64,
    /// Latency events behind `average_latency_ms`. Short-circuited calls add none.
    #[serde(default)]
    pub latency_samples: u64,
    pub errors_by_category: BTreeMap<ErrorCategory, u64>,
    pub success_rate: f64,
    pub error_rate: f64,
}

impl ServiceMetrics {
    /// Recompute `success_rate` and `error_rate` from the counters.
    pub fn finalize_rates(&mut self) {
        if self.total_requests == 0 {
            self.success_rate = 0.0;
            self.error_rate = 0.0;
        } else {
            let total = self.total_requests as f64;
            self.success_rate = self.successful_requests as f64 / total;
            self.error_rate = self.failed_requests as f64 / total;
        }
    }

    /// Sum another backend's metrics into this one, weighting latency by sample count.
    pub fn absorb(&mut self, other: &ServiceMetrics) {
        let samples = self.latency_samples + other.latency_samples;
        if samples > 0 {
            self.average_latency_ms = (self.average_latency_ms * self.latency_samples as f64
                + other.average_latency_ms * other.latency_samples as f64)
                / samples as f64;
        }
        self.latency_samples = samples;
        self.total_requests += other.total_requests;
        self.successful_requests += other.successful_requests;
        self.failed_requests += other.failed_requests;
        self.retried_requests += other.retried_requests;
        self.circuit_breaker_trips += other.circuit_breaker_trips;
        self.fallback_activations += other.fallback_activations;
        for (category, count) in &other.errors_by_category {
            *self.errors_by_category.entry(*category).or_default() += count;
        }
        self.finalize_rates();
    }
}
