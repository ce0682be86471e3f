use quarry_core::errors::ErrorCategory;
use quarry_core::models::{BackendKind, MetricEvent};
use quarry_observability::metrics::{MetricsStore, TimeRange};
use proptest::prelude::*;

fn arb_backend() -> impl Strategy<Value = BackendKind> {
    prop_oneof![
        Just(BackendKind::HostedIndex),
        Just(BackendKind::RelationalVector),
        Just(BackendKind::InMemory),
    ]
}

fn arb_category() -> impl Strategy<Value = ErrorCategory> {
    prop_oneof![
        Just(ErrorCategory::Transient),
        Just(ErrorCategory::RateLimited),
        Just(ErrorCategory::Permanent),
        Just(ErrorCategory::CircuitOpen),
        Just(ErrorCategory::Timeout),
    ]
}

fn arb_event() -> impl Strategy<Value = MetricEvent> {
    (arb_backend(), 0u8..6, arb_category(), 0.0f64..5_000.0).prop_map(
        |(backend, kind, category, latency)| match kind {
            0 => MetricEvent::success(backend),
            1 => MetricEvent::error(backend, category),
            2 => MetricEvent::retry(backend, category),
            3 => MetricEvent::circuit_trip(backend),
            4 => MetricEvent::fallback(backend),
            _ => MetricEvent::latency(backend, latency),
        },
    )
}

// ── Conservation: successful + failed == total ────────────────────────────

proptest! {
    #[test]
    fn successful_plus_failed_equals_total(events in prop::collection::vec(arb_event(), 0..200)) {
        let store = MetricsStore::default();
        store.record_all(events);

        let all = store.snapshot(None, TimeRange::LastDay);
        prop_assert_eq!(all.successful_requests + all.failed_requests, all.total_requests);
        prop_assert!(all.success_rate >= 0.0 && all.success_rate <= 1.0);
        prop_assert!(all.error_rate >= 0.0 && all.error_rate <= 1.0);

        for backend in BackendKind::ALL {
            let m = store.snapshot(Some(backend), TimeRange::LastDay);
            prop_assert_eq!(m.successful_requests + m.failed_requests, m.total_requests);
            let by_category: u64 = m.errors_by_category.values().sum();
            prop_assert_eq!(by_category, m.failed_requests);
        }
    }

    #[test]
    fn reset_zeroes_only_the_targeted_backend(
        events in prop::collection::vec(arb_event(), 0..200),
        target in arb_backend(),
    ) {
        let store = MetricsStore::default();
        store.record_all(events);

        let before: Vec<_> = BackendKind::ALL
            .iter()
            .map(|b| store.snapshot(Some(*b), TimeRange::LastDay))
            .collect();

        store.reset(Some(target));

        for (i, backend) in BackendKind::ALL.iter().enumerate() {
            let after = store.snapshot(Some(*backend), TimeRange::LastDay);
            if *backend == target {
                prop_assert_eq!(after.total_requests, 0);
                prop_assert_eq!(after.retried_requests, 0);
                prop_assert_eq!(after.fallback_activations, 0);
                prop_assert_eq!(after.circuit_breaker_trips, 0);
            } else {
                prop_assert_eq!(&after, &before[i]);
            }
        }
    }
}
