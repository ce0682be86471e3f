//! Per-backend circuit breaker: Closed → Open → HalfOpen → Closed.
//!
//! - Closed: calls pass. `failure_threshold` consecutive penalizing failures
//!   inside `failure_window` open the circuit.
//! - Open: calls are rejected until the cool-down elapses since opening.
//! - HalfOpen: exactly one probe is admitted; concurrent callers are rejected
//!   as if still Open. Probe success closes the circuit; probe failure reopens
//!   it with the cool-down grown by `cooldown_multiplier` (capped).
//!
//! All transitions happen under one mutex per breaker.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use quarry_core::config::CircuitBreakerConfig;
use quarry_core::errors::ErrorCategory;
use quarry_core::models::{BackendKind, CircuitSnapshot, CircuitStatus};
use tokio::time::Instant;

/// Internal state. `Open` always carries its opening time.
#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open {
        since: Instant,
        opened_at: DateTime<Utc>,
    },
    HalfOpen {
        probe_in_flight: bool,
    },
}

#[derive(Debug)]
struct Inner {
    state: State,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    last_failure_category: Option<ErrorCategory>,
    cooldown: Duration,
}

/// State change caused by settling a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Closed or HalfOpen → Open.
    Opened { cooldown: Duration },
    /// HalfOpen → Closed.
    Recovered,
}

/// Breaker for a single backend.
#[derive(Debug)]
pub struct CircuitBreaker {
    backend: BackendKind,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(backend: BackendKind, config: CircuitBreakerConfig) -> Self {
        let cooldown = config.cooldown();
        Self {
            backend,
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                last_failure_at: None,
                last_failure_category: None,
                cooldown,
            }),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Each critical section leaves `Inner` consistent, so poisoning is recoverable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ask to make a call. `None` means short-circuit: do not touch the backend.
    pub fn acquire(&self) -> Option<CircuitPermit<'_>> {
        let mut inner = self.lock();
        match inner.state {
            State::Closed => Some(CircuitPermit::new(self, false)),
            State::Open { since, .. } => {
                if since.elapsed() >= inner.cooldown {
                    inner.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    Some(CircuitPermit::new(self, true))
                } else {
                    None
                }
            }
            State::HalfOpen {
                probe_in_flight: true,
            } => None,
            State::HalfOpen {
                probe_in_flight: false,
            } => {
                inner.state = State::HalfOpen {
                    probe_in_flight: true,
                };
                Some(CircuitPermit::new(self, true))
            }
        }
    }

    fn record_success(&self) -> Option<Transition> {
        let mut inner = self.lock();
        inner.consecutive_failures = 0;
        inner.last_failure_at = None;
        match inner.state {
            State::HalfOpen { .. } => {
                inner.state = State::Closed;
                inner.cooldown = self.config.cooldown();
                Some(Transition::Recovered)
            }
            State::Closed | State::Open { .. } => None,
        }
    }

    fn record_failure(&self, category: ErrorCategory) -> Option<Transition> {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.last_failure_category = Some(category);

        match inner.state {
            State::Closed => {
                let window = self.config.failure_window();
                if inner
                    .last_failure_at
                    .is_some_and(|last| now.duration_since(last) > window)
                {
                    inner.consecutive_failures = 0;
                }
                inner.consecutive_failures += 1;
                inner.last_failure_at = Some(now);
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = State::Open {
                        since: now,
                        opened_at: Utc::now(),
                    };
                    return Some(Transition::Opened {
                        cooldown: inner.cooldown,
                    });
                }
                None
            }
            State::HalfOpen { .. } => {
                inner.consecutive_failures += 1;
                inner.last_failure_at = Some(now);
                let grown = inner.cooldown.mul_f64(self.config.cooldown_multiplier);
                inner.cooldown = grown.min(self.config.max_cooldown());
                inner.state = State::Open {
                    since: now,
                    opened_at: Utc::now(),
                };
                Some(Transition::Opened {
                    cooldown: inner.cooldown,
                })
            }
            // A call admitted before the circuit opened, finishing late.
            State::Open { .. } => {
                inner.consecutive_failures += 1;
                inner.last_failure_at = Some(now);
                None
            }
        }
    }

    fn release_probe(&self) {
        let mut inner = self.lock();
        if let State::HalfOpen {
            probe_in_flight: true,
        } = inner.state
        {
            inner.state = State::HalfOpen {
                probe_in_flight: false,
            };
        }
    }

    /// Point-in-time view for health and admin endpoints.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        let (status, opened_at) = match inner.state {
            State::Closed => (CircuitStatus::Closed, None),
            State::Open { opened_at, .. } => (CircuitStatus::Open, Some(opened_at)),
            State::HalfOpen { .. } => (CircuitStatus::HalfOpen, None),
        };
        CircuitSnapshot {
            status,
            consecutive_failures: inner.consecutive_failures,
            opened_at,
            last_failure_category: inner.last_failure_category,
            cooldown_ms: inner.cooldown.as_millis() as u64,
        }
    }

    pub fn status(&self) -> CircuitStatus {
        self.snapshot().status
    }

    /// Whether a call right now would be rejected without touching the backend.
    pub fn is_rejecting(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            State::Closed => false,
            State::Open { since, .. } => since.elapsed() < inner.cooldown,
            State::HalfOpen { probe_in_flight } => probe_in_flight,
        }
    }

    /// Admin reset back to Closed with the base cool-down.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = State::Closed;
        inner.consecutive_failures = 0;
        inner.last_failure_at = None;
        inner.last_failure_category = None;
        inner.cooldown = self.config.cooldown();
    }
}

/// Admission to make one call. Settle it with [`succeed`](Self::succeed),
/// [`fail`](Self::fail), or [`release`](Self::release); dropping it unsettled
/// releases a HalfOpen probe so a cancelled call cannot wedge the breaker.
#[derive(Debug)]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    /// This call is the single HalfOpen trial.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn succeed(mut self) -> Option<Transition> {
        self.settled = true;
        self.breaker.record_success()
    }

    /// Report a failure. Categories that are not the backend's fault only release the probe.
    pub fn fail(mut self, category: ErrorCategory) -> Option<Transition> {
        self.settled = true;
        if category.penalizes_backend() {
            self.breaker.record_failure(category)
        } else {
            self.breaker.release_probe();
            None
        }
    }

    /// Settle without affecting breaker state.
    pub fn release(mut self) {
        self.settled = true;
        self.breaker.release_probe();
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe();
        }
    }
}

/// One breaker per registered backend, shared across concurrent requests.
#[derive(Debug, Default)]
pub struct CircuitRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<BackendKind, Arc<CircuitBreaker>>,
}

impl CircuitRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Create the breaker for `backend` if missing and return it.
    pub fn register(&self, backend: BackendKind) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(backend)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(backend, self.config.clone())))
            .clone()
    }

    pub fn get(&self, backend: BackendKind) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(&backend).map(|b| Arc::clone(b.value()))
    }

    pub fn snapshot(&self) -> BTreeMap<BackendKind, CircuitSnapshot> {
        self.breakers
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect()
    }

    /// Reset one breaker, or all when `None`. Returns the backends reset.
    pub fn reset(&self, backend: Option<BackendKind>) -> Vec<BackendKind> {
        match backend {
            Some(b) => match self.breakers.get(&b) {
                Some(breaker) => {
                    breaker.reset();
                    vec![b]
                }
                None => Vec::new(),
            },
            None => {
                let mut reset: Vec<BackendKind> = self
                    .breakers
                    .iter()
                    .map(|entry| {
                        entry.value().reset();
                        *entry.key()
                    })
                    .collect();
                reset.sort();
                reset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            failure_window_secs: 60,
            cooldown_secs: 30,
            cooldown_multiplier: 2.0,
            max_cooldown_secs: 90,
        }
    }

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(BackendKind::HostedIndex, config())
    }

    fn fail(b: &CircuitBreaker, category: ErrorCategory) -> Option<Transition> {
        b.acquire().expect("admitted").fail(category)
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_consecutive_failures() {
        let b = breaker();
        assert_eq!(fail(&b, ErrorCategory::Transient), None);
        assert_eq!(fail(&b, ErrorCategory::Transient), None);
        assert!(matches!(
            fail(&b, ErrorCategory::Transient),
            Some(Transition::Opened { .. })
        ));

        let snap = b.snapshot();
        assert_eq!(snap.status, CircuitStatus::Open);
        assert!(snap.opened_at.is_some());
        assert!(b.acquire().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_consecutive_count() {
        let b = breaker();
        fail(&b, ErrorCategory::Transient);
        fail(&b, ErrorCategory::Transient);
        b.acquire().unwrap().succeed();
        fail(&b, ErrorCategory::Transient);
        assert_eq!(b.status(), CircuitStatus::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_do_not_penalize() {
        let b = breaker();
        for _ in 0..10 {
            assert_eq!(fail(&b, ErrorCategory::Permanent), None);
        }
        assert_eq!(b.status(), CircuitStatus::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_outside_window_restart_count() {
        let b = breaker();
        fail(&b, ErrorCategory::Transient);
        fail(&b, ErrorCategory::Transient);
        tokio::time::advance(Duration::from_secs(61)).await;
        fail(&b, ErrorCategory::Transient);
        assert_eq!(b.status(), CircuitStatus::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_exactly_one_probe() {
        let b = breaker();
        for _ in 0..3 {
            fail(&b, ErrorCategory::Transient);
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let probe = b.acquire().expect("probe admitted");
        assert!(probe.is_probe());
        assert_eq!(b.status(), CircuitStatus::HalfOpen);
        assert!(b.acquire().is_none(), "second caller must be rejected");
        assert!(b.is_rejecting());

        assert_eq!(probe.succeed(), Some(Transition::Recovered));
        assert_eq!(b.status(), CircuitStatus::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_reopens_with_grown_cooldown() {
        let b = breaker();
        for _ in 0..3 {
            fail(&b, ErrorCategory::Transient);
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        let t = b.acquire().unwrap().fail(ErrorCategory::Transient);
        assert_eq!(
            t,
            Some(Transition::Opened {
                cooldown: Duration::from_secs(60)
            })
        );

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(b.acquire().is_none(), "grown cool-down not yet elapsed");

        tokio::time::advance(Duration::from_secs(15)).await;
        let t = b.acquire().unwrap().fail(ErrorCategory::Transient);
        assert_eq!(
            t,
            Some(Transition::Opened {
                cooldown: Duration::from_secs(90)
            }),
            "capped at max_cooldown"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_restores_base_cooldown() {
        let b = breaker();
        for _ in 0..3 {
            fail(&b, ErrorCategory::Transient);
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        b.acquire().unwrap().fail(ErrorCategory::Transient);
        tokio::time::advance(Duration::from_secs(60)).await;
        b.acquire().unwrap().succeed();
        assert_eq!(b.snapshot().cooldown_ms, 30_000);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_probe_releases_gate() {
        let b = breaker();
        for _ in 0..3 {
            fail(&b, ErrorCategory::Transient);
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        drop(b.acquire().unwrap());
        assert_eq!(b.status(), CircuitStatus::HalfOpen);
        assert!(b.acquire().is_some(), "gate reopened after cancelled probe");
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_probe_keeps_half_open() {
        let b = breaker();
        for _ in 0..3 {
            fail(&b, ErrorCategory::Transient);
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(b.acquire().unwrap().fail(ErrorCategory::Permanent), None);
        assert_eq!(b.status(), CircuitStatus::HalfOpen);
        assert!(b.acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn registry_reset_targets_one_backend() {
        let registry = CircuitRegistry::new(config());
        let hosted = registry.register(BackendKind::HostedIndex);
        let memory = registry.register(BackendKind::InMemory);
        for _ in 0..3 {
            fail(&hosted, ErrorCategory::Transient);
            fail(&memory, ErrorCategory::Transient);
        }

        assert_eq!(registry.reset(Some(BackendKind::HostedIndex)), vec![BackendKind::HostedIndex]);
        let snap = registry.snapshot();
        assert_eq!(snap[&BackendKind::HostedIndex].status, CircuitStatus::Closed);
        assert_eq!(snap[&BackendKind::InMemory].status, CircuitStatus::Open);

        assert_eq!(
            registry.reset(None),
            vec![BackendKind::HostedIndex, BackendKind::InMemory]
        );
        assert!(registry.reset(Some(BackendKind::RelationalVector)).is_empty());
    }
}
