//! Structured log events for key orchestration operations.
//!
//! Each function emits a `tracing` event with structured fields.

use quarry_core::errors::ErrorCategory;
use quarry_core::models::BackendKind;

/// Log a breaker opening.
pub fn circuit_opened(backend: BackendKind, failures: u32, cooldown_ms: u64) {
    tracing::warn!(
        event = "circuit_opened",
        backend = %backend,
        failures = failures,
        cooldown_ms = cooldown_ms,
        "circuit opened"
    );
}

/// Log a breaker closing after a successful probe.
pub fn circuit_recovered(backend: BackendKind) {
    tracing::info!(
        event = "circuit_recovered",
        backend = %backend,
        "circuit closed after successful probe"
    );
}

/// Log a call rejected by an open breaker.
pub fn circuit_short_circuited(backend: BackendKind) {
    tracing::debug!(
        event = "circuit_short_circuited",
        backend = %backend,
        "call short-circuited"
    );
}

/// Log a retry about to sleep.
pub fn backend_retry(backend: BackendKind, attempt: u32, category: ErrorCategory, delay_ms: u64) {
    tracing::debug!(
        event = "backend_retry",
        backend = %backend,
        attempt = attempt,
        category = %category,
        delay_ms = delay_ms,
        "retrying backend call"
    );
}

/// Log a final backend failure for one invocation.
pub fn backend_failed(backend: BackendKind, attempts: u32, category: ErrorCategory, message: &str) {
    tracing::warn!(
        event = "backend_failed",
        backend = %backend,
        attempts = attempts,
        category = %category,
        error = %message,
        "backend call failed"
    );
}

/// Log a fallback activation.
pub fn fallback_activated(failed: BackendKind, fallback: BackendKind) {
    tracing::warn!(
        event = "fallback_activated",
        failed = %failed,
        fallback = %fallback,
        "fallback backend activated"
    );
}

/// Log a branch excluded by the fan-out deadline.
pub fn fanout_timeout(backend: BackendKind, deadline_ms: u64) {
    tracing::warn!(
        event = "fanout_timeout",
        backend = %backend,
        deadline_ms = deadline_ms,
        "backend missed fan-out deadline"
    );
}

/// Log a result cache hit.
pub fn cache_hit(fingerprint: &str) {
    tracing::debug!(event = "cache_hit", fingerprint = %fingerprint, "result cache hit");
}

/// Log a completed search.
pub fn search_completed(results: usize, backends_ok: usize, backends_total: usize, elapsed_ms: u64) {
    tracing::info!(
        event = "search_completed",
        results = results,
        backends_ok = backends_ok,
        backends_total = backends_total,
        elapsed_ms = elapsed_ms,
        "search completed"
    );
}
