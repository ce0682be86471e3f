//! Tracing setup: subscriber installation, span macros, and named events.

pub mod events;
pub mod spans;

use quarry_core::config::ObservabilityConfig;
use quarry_core::constants::LOG_ENV_VAR;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Respects the `QUARRY_LOG` environment variable for filtering and falls
/// back to the configured log level. Returns `false` if a subscriber was
/// already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if config.json_logs {
        builder
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init()
            .is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
