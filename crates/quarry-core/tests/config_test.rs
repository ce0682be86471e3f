//! Tests for QuarryConfig loading, env overrides, and validation.

use std::io::Write;

use quarry_core::config::QuarryConfig;
use quarry_core::errors::ConfigError;
use quarry_core::models::BackendKind;

#[test]
fn empty_toml_yields_defaults() {
    let config = QuarryConfig::from_toml_str("").unwrap();
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.circuit_breaker.failure_threshold, 5);
    assert_eq!(config.circuit_breaker.cooldown_secs, 30);
    assert_eq!(config.cache.ttl_secs, 180);
    assert_eq!(config.orchestrator.fanout_deadline_ms, 10_000);
    assert_eq!(
        config.orchestrator.fallback_backend,
        Some(BackendKind::InMemory)
    );
    assert!(!config.scoring.semantic_enabled);
}

#[test]
fn partial_sections_override_only_named_fields() {
    let config = QuarryConfig::from_toml_str(
        r#"
        [retry]
        max_attempts = 5

        [orchestrator]
        fallback_backend = "relational_vector"
        fanout_deadline_ms = 2500

        [backends.hosted_index]
        enabled = true
        store_id = "vs_123"
        "#,
    )
    .unwrap();
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.transient_base_delay_ms, 200);
    assert_eq!(
        config.orchestrator.fallback_backend,
        Some(BackendKind::RelationalVector)
    );
    assert_eq!(config.orchestrator.fanout_deadline_ms, 2500);
    assert!(config.backends.hosted_index.enabled);
    assert_eq!(config.backends.hosted_index.store_id, "vs_123");
}

#[test]
fn invalid_weights_are_rejected() {
    let err = QuarryConfig::from_toml_str(
        r#"
        [scoring.weights]
        similarity = 0.9
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { .. }));
}

#[test]
fn zero_attempts_is_rejected() {
    let err = QuarryConfig::from_toml_str("[retry]\nmax_attempts = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = QuarryConfig::from_toml_str("[retry\nmax_attempts = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed { .. }));
}

#[test]
fn env_overrides_apply_secrets() {
    let mut config = QuarryConfig::default();
    config.apply_env(|key| match key {
        "QUARRY_HOSTED_INDEX_API_KEY" => Some("sk-test".to_string()),
        "QUARRY_HOSTED_INDEX_STORE_ID" => Some("vs_env".to_string()),
        _ => None,
    });
    assert_eq!(
        config.backends.hosted_index.api_key.as_deref(),
        Some("sk-test")
    );
    assert_eq!(config.backends.hosted_index.store_id, "vs_env");
}

#[test]
fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[cache]\nttl_secs = 60").unwrap();
    let config = QuarryConfig::load(file.path()).unwrap();
    assert_eq!(config.cache.ttl_secs, 60);

    let missing = QuarryConfig::load("/nonexistent/quarry.toml").unwrap_err();
    assert!(matches!(missing, ConfigError::ReadFailed { .. }));
}
