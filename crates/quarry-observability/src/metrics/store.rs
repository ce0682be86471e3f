//! Append-only, concurrency-safe metric event log.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use quarry_core::config::MetricsConfig;
use quarry_core::models::{BackendKind, MetricEvent, MetricKind, ServiceMetrics};

use super::TimeRange;

/// Process-wide metric events for every backend.
///
/// Events are appended under a mutex so parallel backend calls never lose
/// updates. Events older than the retention window are pruned lazily on
/// read; there is no hard cap that could drop recent data.
#[derive(Debug)]
pub struct MetricsStore {
    events: Mutex<Vec<MetricEvent>>,
    retention: chrono::Duration,
}

impl MetricsStore {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            retention: config.retention(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MetricEvent>> {
        // Every write is a single push or retain, so a poisoned vector is still consistent.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one event.
    pub fn record(&self, event: MetricEvent) {
        self.lock().push(event);
    }

    /// Append several events atomically with respect to readers.
    pub fn record_all(&self, events: impl IntoIterator<Item = MetricEvent>) {
        self.lock().extend(events);
    }

    /// Aggregate retained events for one backend (or all) within `range`.
    pub fn snapshot(&self, backend: Option<BackendKind>, range: TimeRange) -> ServiceMetrics {
        self.snapshot_at(backend, range, Utc::now())
    }

    /// Same as [`snapshot`](Self::snapshot) with an explicit "now".
    pub fn snapshot_at(
        &self,
        backend: Option<BackendKind>,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> ServiceMetrics {
        let mut events = self.lock();
        Self::prune_locked(&mut events, now - self.retention);
        let window = Window::new(range, now);
        aggregate(
            events
                .iter()
                .filter(|e| window.contains(e))
                .filter(|e| backend.map_or(true, |b| e.backend == b)),
        )
    }

    /// One snapshot per backend that has retained events in `range`.
    pub fn snapshot_by_backend(&self, range: TimeRange) -> BTreeMap<BackendKind, ServiceMetrics> {
        self.snapshot_by_backend_at(range, Utc::now())
    }

    /// Same as [`snapshot_by_backend`](Self::snapshot_by_backend) with an explicit "now".
    pub fn snapshot_by_backend_at(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> BTreeMap<BackendKind, ServiceMetrics> {
        let mut events = self.lock();
        Self::prune_locked(&mut events, now - self.retention);
        let window = Window::new(range, now);

        let mut grouped: BTreeMap<BackendKind, Vec<&MetricEvent>> = BTreeMap::new();
        for event in events.iter().filter(|e| window.contains(e)) {
            grouped.entry(event.backend).or_default().push(event);
        }
        grouped
            .into_iter()
            .map(|(backend, evs)| (backend, aggregate(evs.into_iter())))
            .collect()
    }

    /// Clear events for one backend, or all when `None`. Returns how many were removed.
    pub fn reset(&self, backend: Option<BackendKind>) -> usize {
        let mut events = self.lock();
        let before = events.len();
        match backend {
            Some(b) => events.retain(|e| e.backend != b),
            None => events.clear(),
        }
        before - events.len()
    }

    /// Drop events older than the retention window. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut events = self.lock();
        Self::prune_locked(&mut events, Utc::now() - self.retention)
    }

    fn prune_locked(events: &mut Vec<MetricEvent>, cutoff: DateTime<Utc>) -> usize {
        let before = events.len();
        events.retain(|e| e.timestamp >= cutoff);
        before - events.len()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

/// Read window `[now - range, now]`. Both snapshot paths filter through it.
#[derive(Debug, Clone, Copy)]
struct Window {
    since: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl Window {
    fn new(range: TimeRange, now: DateTime<Utc>) -> Self {
        Self {
            since: range.since(now),
            until: now,
        }
    }

    fn contains(&self, event: &MetricEvent) -> bool {
        event.timestamp >= self.since && event.timestamp <= self.until
    }
}

/// Pure aggregation. `total_requests` is derived from success + error events,
/// so `successful + failed == total` holds for any event sequence.
fn aggregate<'a>(events: impl Iterator<Item = &'a MetricEvent>) -> ServiceMetrics {
    let mut metrics = ServiceMetrics::default();
    let mut latency_sum = 0.0;
    let mut latency_count = 0u64;

    for event in events {
        match event.kind {
            MetricKind::Success => metrics.successful_requests += 1,
            MetricKind::Error => {
                metrics.failed_requests += 1;
                if let Some(category) = event.error_category {
                    *metrics.errors_by_category.entry(category).or_default() += 1;
                }
            }
            MetricKind::Retry => metrics.retried_requests += 1,
            MetricKind::CircuitTrip => metrics.circuit_breaker_trips += 1,
            MetricKind::Fallback => metrics.fallback_activations += 1,
            MetricKind::Latency => {
                if event.value.is_finite() && event.value >= 0.0 {
                    latency_sum += event.value;
                    latency_count += 1;
                }
            }
        }
    }

    metrics.total_requests = metrics.successful_requests + metrics.failed_requests;
    metrics.latency_samples = latency_count;
    metrics.average_latency_ms = if latency_count == 0 {
        0.0
    } else {
        latency_sum / latency_count as f64
    };
    metrics.finalize_rates();
    metrics
}
