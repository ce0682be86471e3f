//! Client-facing errors with stable codes.

use quarry_core::errors::{BackendFailure, ConfigError, OrchestrationError, TimeoutScope};
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("all {} requested backends are unavailable", .failures.len())]
    Unavailable { failures: Vec<BackendFailure> },

    #[error("response failed validation: {0}")]
    MalformedResponse(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Orchestration(OrchestrationError),
}

impl ApiError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Timeout { .. } => "timeout",
            Self::Unavailable { .. } => "backends_unavailable",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Config(_) => "config_error",
            Self::Orchestration(_) => "internal",
        }
    }

    /// HTTP-style status for transports that want one.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Timeout { .. } => 504,
            Self::Unavailable { .. } => 503,
            Self::MalformedResponse(_) | Self::Config(_) | Self::Orchestration(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            failures: match self {
                Self::Unavailable { failures } => failures.clone(),
                _ => Vec::new(),
            },
        }
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::InvalidQuery { reason } => Self::InvalidRequest(reason),
            OrchestrationError::AllBackendsUnavailable { failures } => Self::Unavailable { failures },
            OrchestrationError::Timeout {
                scope: TimeoutScope::Request,
                elapsed_ms,
            } => Self::Timeout { elapsed_ms },
            other => Self::Orchestration(other),
        }
    }
}

/// Serialized error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BackendFailure>,
}
