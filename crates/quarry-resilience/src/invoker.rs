//! Fault-tolerant wrapper around a single adapter call.
//!
//! Order per invocation: breaker admission, then up to `max_attempts` calls
//! with backoff between retryable failures, then one settlement of the
//! breaker permit. Every outcome lands in the metrics store; nothing is
//! thrown past this boundary.
//!
//! With a deadline, each adapter call and each backoff sleep is bounded by
//! it. A call still pending at the deadline settles the permit as a
//! Timeout, so a half-open breaker never waits on a call that won't return.

use std::sync::Arc;
use std::time::Duration;

use quarry_core::errors::{BackendError, ErrorCategory, OrchestrationError};
use quarry_core::models::{BackendKind, Candidate, MetricEvent};
use quarry_core::traits::{BackendRequest, IBackendAdapter};
use quarry_observability::tracing_setup::events;
use quarry_observability::MetricsStore;
use tokio::time::Instant;
use tracing::Instrument;

use crate::circuit_breaker::{CircuitRegistry, Transition};
use crate::retry::RetryPolicy;

/// Result of one invocation, with the bookkeeping the orchestrator reports.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub backend: BackendKind,
    pub result: Result<Vec<Candidate>, OrchestrationError>,
    /// Adapter calls made. Zero when short-circuited.
    pub attempts: u32,
    pub latency: Duration,
}

impl Invocation {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

/// Composes [`RetryPolicy`] and the per-backend breakers around adapter calls.
#[derive(Debug, Clone)]
pub struct ResilientInvoker {
    policy: RetryPolicy,
    circuits: Arc<CircuitRegistry>,
    metrics: Arc<MetricsStore>,
    fallback: Option<BackendKind>,
}

impl ResilientInvoker {
    pub fn new(
        policy: RetryPolicy,
        circuits: Arc<CircuitRegistry>,
        metrics: Arc<MetricsStore>,
        fallback: Option<BackendKind>,
    ) -> Self {
        Self {
            policy,
            circuits,
            metrics,
            fallback,
        }
    }

    pub fn circuits(&self) -> &Arc<CircuitRegistry> {
        &self.circuits
    }

    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `adapter` once, retrying inside this call as the policy allows.
    pub async fn invoke(&self, adapter: &dyn IBackendAdapter, request: &BackendRequest) -> Invocation {
        let backend = adapter.kind();
        let span = quarry_observability::backend_span!(backend);
        self.invoke_inner(adapter, request, None).instrument(span).await
    }

    /// Like [`invoke`](Self::invoke), but every adapter call and backoff
    /// sleep ends at `deadline`.
    pub async fn invoke_until(
        &self,
        adapter: &dyn IBackendAdapter,
        request: &BackendRequest,
        deadline: Instant,
    ) -> Invocation {
        let backend = adapter.kind();
        let span = quarry_observability::backend_span!(backend);
        self.invoke_inner(adapter, request, Some(deadline))
            .instrument(span)
            .await
    }

    async fn invoke_inner(
        &self,
        adapter: &dyn IBackendAdapter,
        request: &BackendRequest,
        deadline: Option<Instant>,
    ) -> Invocation {
        let backend = adapter.kind();
        let breaker = self.circuits.register(backend);

        let Some(permit) = breaker.acquire() else {
            events::circuit_short_circuited(backend);
            self.metrics.record_all([
                MetricEvent::error(backend, ErrorCategory::CircuitOpen),
                MetricEvent::circuit_trip(backend),
            ]);
            self.signal_fallback(backend);
            return Invocation {
                backend,
                result: Err(OrchestrationError::CircuitOpen { backend }),
                attempts: 0,
                latency: Duration::ZERO,
            };
        };

        let started = Instant::now();
        let mut attempt = 0u32;
        let outcome: Result<Vec<Candidate>, BackendError> = loop {
            attempt += 1;
            let err = match call_until(adapter, request, deadline).await {
                Ok(candidates) => match validate_all(&candidates) {
                    Ok(()) => break Ok(candidates),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            let decision = self.policy.decide(attempt, err.category);
            if !decision.retry {
                break Err(err);
            }
            if deadline.is_some_and(|d| Instant::now() + decision.delay >= d) {
                break Err(err);
            }
            events::backend_retry(backend, attempt, err.category, decision.delay.as_millis() as u64);
            // One retry event per invocation, however many retries follow.
            if attempt == 1 {
                self.metrics.record(MetricEvent::retry(backend, err.category));
            }
            tokio::time::sleep(decision.delay).await;
        };
        let latency = started.elapsed();
        let latency_event = MetricEvent::latency(backend, latency.as_secs_f64() * 1000.0);

        match outcome {
            Ok(candidates) => {
                if let Some(Transition::Recovered) = permit.succeed() {
                    events::circuit_recovered(backend);
                }
                self.metrics
                    .record_all([latency_event, MetricEvent::success(backend)]);
                Invocation {
                    backend,
                    result: Ok(candidates),
                    attempts: attempt,
                    latency,
                }
            }
            Err(err) => {
                if let Some(Transition::Opened { cooldown }) = permit.fail(err.category) {
                    let failures = breaker.snapshot().consecutive_failures;
                    events::circuit_opened(backend, failures, cooldown.as_millis() as u64);
                }
                events::backend_failed(backend, attempt, err.category, &err.message);
                self.metrics
                    .record_all([latency_event, MetricEvent::error(backend, err.category)]);
                self.signal_fallback(backend);
                Invocation {
                    backend,
                    result: Err(OrchestrationError::Backend {
                        backend,
                        category: err.category,
                        message: err.message,
                        attempts: attempt,
                    }),
                    attempts: attempt,
                    latency,
                }
            }
        }
    }

    fn signal_fallback(&self, failed: BackendKind) {
        if let Some(fallback) = self.fallback {
            events::fallback_activated(failed, fallback);
            self.metrics.record(MetricEvent::fallback(failed));
        }
    }
}

async fn call_until(
    adapter: &dyn IBackendAdapter,
    request: &BackendRequest,
    deadline: Option<Instant>,
) -> Result<Vec<Candidate>, BackendError> {
    let Some(deadline) = deadline else {
        return adapter.search(request).await;
    };
    match tokio::time::timeout_at(deadline, adapter.search(request)).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::new(
            ErrorCategory::Timeout,
            "no response before the fan-out deadline",
        )),
    }
}

fn validate_all(candidates: &[Candidate]) -> Result<(), BackendError> {
    candidates.iter().try_for_each(Candidate::validate)
}
