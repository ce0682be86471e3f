use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a failed call. Drives retry and circuit-breaker decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Timeout, 5xx, connection reset. Retryable.
    Transient,
    /// Upstream throttling. Retryable with a longer base delay.
    RateLimited,
    /// Auth failure, bad request, not found, malformed payload. Never retried.
    Permanent,
    /// Local short-circuit by an open breaker. Not a backend error.
    CircuitOpen,
    /// A fan-out or request deadline elapsed.
    Timeout,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::Permanent => "permanent",
            Self::CircuitOpen => "circuit_open",
            Self::Timeout => "timeout",
        }
    }

    /// Whether a failure of this category may be retried within one invocation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }

    /// Whether a failure of this category counts against the backend's breaker.
    pub fn penalizes_backend(&self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited | Self::Timeout)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by a backend adapter: `{category, message}`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{category}: {message}")]
pub struct BackendError {
    pub category: ErrorCategory,
    pub message: String,
}

impl BackendError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Transient, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RateLimited, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Permanent, message)
    }

    /// Malformed payload at the adapter boundary.
    pub fn malformed(what: &str, reason: impl fmt::Display) -> Self {
        Self::permanent(format!("malformed {what}: {reason}"))
    }
}
