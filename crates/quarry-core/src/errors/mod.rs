mod backend_error;
mod config_error;
mod orchestration_error;

pub use backend_error::{BackendError, ErrorCategory};
pub use config_error::ConfigError;
pub use orchestration_error::{BackendFailure, OrchestrationError, TimeoutScope};

/// Top-level error for the Quarry workspace.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error("backend error: {0}")]
    BackendError(#[from] BackendError),

    #[error("orchestration error: {0}")]
    OrchestrationError(#[from] OrchestrationError),

    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("concurrency error: {0}")]
    ConcurrencyError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

pub type QuarryResult<T> = Result<T, QuarryError>;
