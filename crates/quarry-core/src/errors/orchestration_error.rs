use serde::{Deserialize, Serialize};

use super::backend_error::ErrorCategory;
use crate::models::BackendKind;

/// Which deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutScope {
    /// The shared fan-out deadline for one backend branch.
    FanOut,
    /// The client-facing request timeout.
    Request,
}

/// One backend's failure, as reported inside `AllBackendsUnavailable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: BackendKind,
    pub category: ErrorCategory,
    pub message: String,
}

/// Orchestration-level errors. `Clone` so coalesced callers can share one outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestrationError {
    #[error("circuit open for backend {backend}")]
    CircuitOpen { backend: BackendKind },

    #[error("backend {backend} failed after {attempts} attempt(s): {category}: {message}")]
    Backend {
        backend: BackendKind,
        category: ErrorCategory,
        message: String,
        attempts: u32,
    },

    #[error("all backends unavailable ({} failed)", .failures.len())]
    AllBackendsUnavailable { failures: Vec<BackendFailure> },

    #[error("{scope:?} timeout after {elapsed_ms}ms")]
    Timeout { scope: TimeoutScope, elapsed_ms: u64 },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl OrchestrationError {
    /// Category used when recording this error against a backend.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CircuitOpen { .. } => ErrorCategory::CircuitOpen,
            Self::Backend { category, .. } => *category,
            Self::AllBackendsUnavailable { .. } => ErrorCategory::Transient,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::InvalidQuery { .. } => ErrorCategory::Permanent,
        }
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }
}
