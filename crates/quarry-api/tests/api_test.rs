//! Client-surface tests: search shaping, request timeout, metrics read and reset.

use std::sync::Arc;
use std::time::Duration;

use quarry_api::{
    ApiError, MetricsRequest, QuarryRuntime, ResetRequest, ResetTarget, RuntimeOptions,
    SearchRequest,
};
use quarry_core::config::QuarryConfig;
use quarry_core::errors::BackendError;
use quarry_core::models::BackendKind;
use quarry_core::traits::IBackendAdapter;
use quarry_observability::{MetricsReading, TimeRange};
use quarry_orchestrator::Orchestrator;
use test_fixtures::{candidate, fixture_path, ScriptedAdapter};

fn runtime(config: QuarryConfig, adapters: Vec<ScriptedAdapter>) -> QuarryRuntime {
    let adapters = adapters
        .into_iter()
        .map(|a| Arc::new(a) as Arc<dyn IBackendAdapter>);
    let orch = Orchestrator::builder(config).adapters(adapters).build().unwrap();
    QuarryRuntime::with_orchestrator(Arc::new(orch))
}

fn memory_backend() -> ScriptedAdapter {
    ScriptedAdapter::ok(
        BackendKind::InMemory,
        vec![
            candidate(BackendKind::InMemory, "m1", 0.9, "Calibration steps for torque wrenches"),
            candidate(BackendKind::InMemory, "m2", 0.4, "Cafeteria menu for the week"),
        ],
    )
}

#[tokio::test(start_paused = true)]
async fn search_response_uses_client_shape() {
    let rt = runtime(QuarryConfig::default(), vec![memory_backend()]);
    let request = SearchRequest::new("calibration steps").with_sources(["in_memory"]);

    let first = rt.search(request.clone()).await.unwrap();
    assert_eq!(first.results.len(), 2);
    assert_eq!(first.results[0].id, "m1");
    assert!(!first.search_metadata.cached);
    assert!(first.search_metadata.features.relevance_scoring);
    assert!(!first.search_metadata.features.cross_encoder);

    let json = serde_json::to_value(&first).unwrap();
    assert!(json["searchMetadata"]["totalResponseTimeMs"].is_u64());
    assert!(json["results"][0]["relevanceScore"].is_f64());
    assert!(json["searchMetadata"]["perBackendStatus"]["in_memory"]["ok"]
        .as_bool()
        .unwrap());

    let second = rt.search(request).await.unwrap();
    assert!(second.search_metadata.cached);
    assert_eq!(first.results, second.results);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_is_separate_from_fanout_deadline() {
    let mut config = QuarryConfig::default();
    config.orchestrator.request_timeout_ms = 500;
    config.orchestrator.fanout_deadline_ms = 5_000;
    let rt = runtime(config, vec![ScriptedAdapter::hanging(BackendKind::InMemory)]);

    let err = rt
        .search(SearchRequest::new("calibration").with_sources(["in_memory"]))
        .await
        .unwrap_err();
    match err {
        ApiError::Timeout { elapsed_ms } => assert!(elapsed_ms >= 500),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(rt.request_timeout(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn every_backend_down_is_service_unavailable() {
    let rt = runtime(
        QuarryConfig::default(),
        vec![ScriptedAdapter::failing(
            BackendKind::InMemory,
            BackendError::permanent("index missing"),
        )],
    );
    let err = rt
        .search(SearchRequest::new("q").with_sources(["in_memory"]))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(err.to_body().failures[0].backend, BackendKind::InMemory);
}

#[tokio::test(start_paused = true)]
async fn bad_requests_are_rejected() {
    let rt = runtime(QuarryConfig::default(), vec![memory_backend()]);
    let mut request = SearchRequest::new("calibration");
    request.threshold = Some(3.0);
    assert_eq!(rt.search(request).await.unwrap_err().code(), "invalid_request");

    let mut request = SearchRequest::new("calibration");
    request.weights.authority = Some(-1.0);
    assert_eq!(rt.search(request).await.unwrap_err().code(), "invalid_request");
}

#[tokio::test(start_paused = true)]
async fn metrics_read_reports_unknown_backends_as_unavailable() {
    let rt = runtime(QuarryConfig::default(), vec![memory_backend()]);
    rt.search(SearchRequest::new("calibration").with_sources(["in_memory"]))
        .await
        .unwrap();

    let response = rt.read_metrics(&MetricsRequest {
        backends: vec!["in_memory".into(), "hosted_index".into(), "carrier_pigeon".into()],
        time_range: TimeRange::LastHour,
        include_details: true,
    });

    assert_eq!(response.summary.total_requests, 1);
    assert_eq!(response.summary.overall_success_rate, 1.0);
    assert_eq!(response.summary.unavailable_backends, 2);
    let details = response.backends.unwrap();
    assert!(details["in_memory"].is_available());
    assert!(matches!(details["hosted_index"], MetricsReading::Unavailable { .. }));
    assert!(matches!(details["carrier_pigeon"], MetricsReading::Unavailable { .. }));

    let bare = rt.read_metrics(&MetricsRequest::default());
    assert!(bare.backends.is_none());
    assert_eq!(bare.time_range, TimeRange::LastDay);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_counters_per_backend() {
    let rt = runtime(QuarryConfig::default(), vec![memory_backend()]);
    rt.search(SearchRequest::new("calibration").with_sources(["in_memory"]))
        .await
        .unwrap();

    let response = rt.reset_metrics(&ResetRequest::default()).unwrap();
    let outcome = &response.outcomes["in_memory"];
    assert!(outcome.reset);
    assert!(outcome.events_cleared > 0);
    assert!(!outcome.circuit_reset);

    let after = rt.read_metrics(&MetricsRequest::default());
    assert_eq!(after.summary.total_requests, 0);

    let response = rt
        .reset_metrics(&ResetRequest {
            backends: ResetTarget::Named(vec!["in_memory".into(), "nowhere".into()]),
            reset_circuits: true,
        })
        .unwrap();
    assert!(response.outcomes["in_memory"].circuit_reset);
    assert!(!response.outcomes["nowhere"].reset);
    assert!(response.outcomes["nowhere"].error.is_some());

    let err = rt
        .reset_metrics(&ResetRequest {
            backends: ResetTarget::Keyword("some".into()),
            reset_circuits: false,
        })
        .unwrap_err();
    assert_eq!(err.code(), "invalid_request");
}

#[tokio::test]
async fn runtime_starts_from_toml_with_seeded_in_memory_backend() {
    let toml = format!(
        "[backends.in_memory]\nenabled = true\nseed_path = \"{}\"\n",
        fixture_path("corpus.json").display()
    );
    let rt = QuarryRuntime::start(RuntimeOptions {
        config_toml: Some(toml),
        ..RuntimeOptions::default()
    })
    .unwrap();
    assert_eq!(
        rt.orchestrator().registered_backends().into_iter().collect::<Vec<_>>(),
        vec![BackendKind::InMemory]
    );

    let mut request = SearchRequest::new("calibration steps");
    request.threshold = Some(0.3);
    request.max_results = Some(5);
    let response = rt.search(request).await.unwrap();
    let ids: Vec<&str> = response.results.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&"cal-001"));
    assert!(ids.contains(&"cal-002"));
    assert!(!ids.contains(&"misc-001"));
}

#[test]
fn runtime_rejects_invalid_config() {
    let result = QuarryRuntime::start(RuntimeOptions {
        config_toml: Some("[retry]\nmax_attempts = 0\n".into()),
        ..RuntimeOptions::default()
    });
    assert!(matches!(result, Err(ApiError::Config(_))));
}
