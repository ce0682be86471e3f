//! QuarryRuntime: owns the orchestrator and the client-facing request timeout.
//!
//! `start` is the one place that reads configuration, installs tracing,
//! and builds the configured adapters.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quarry_backends::build_adapters;
use quarry_core::config::QuarryConfig;
use quarry_core::traits::{IFeedbackSource, ISemanticMatcher};
use quarry_observability::tracing_setup::init_tracing;
use quarry_orchestrator::Orchestrator;
use tracing::info;

use crate::errors::ApiResult;

/// Options for starting a runtime.
#[derive(Default)]
pub struct RuntimeOptions {
    /// TOML file to load. Ignored when `config_toml` is set.
    pub config_path: Option<PathBuf>,
    /// Inline TOML. If neither source is set, defaults are used.
    pub config_toml: Option<String>,
    pub feedback: Option<Arc<dyn IFeedbackSource>>,
    pub semantic_matcher: Option<Arc<dyn ISemanticMatcher>>,
    /// Install the global tracing subscriber from the observability section.
    pub install_tracing: bool,
}

pub struct QuarryRuntime {
    orchestrator: Arc<Orchestrator>,
    request_timeout: Duration,
}

impl QuarryRuntime {
    /// Load configuration, build every configured adapter, and assemble the orchestrator.
    pub fn start(opts: RuntimeOptions) -> ApiResult<Self> {
        let config = Self::load_config(&opts)?;
        if opts.install_tracing {
            init_tracing(&config.observability);
        }

        let adapters = build_adapters(&config.backends)?;
        let mut builder = Orchestrator::builder(config).adapters(adapters);
        if let Some(feedback) = opts.feedback {
            builder = builder.feedback(feedback);
        }
        if let Some(matcher) = opts.semantic_matcher {
            builder = builder.semantic_matcher(matcher);
        }
        let orchestrator = builder.build()?;
        info!(
            backends = ?orchestrator.registered_backends(),
            "quarry runtime started"
        );
        Ok(Self::with_orchestrator(Arc::new(orchestrator)))
    }

    /// Wrap an already-built orchestrator. The timeout comes from its config.
    pub fn with_orchestrator(orchestrator: Arc<Orchestrator>) -> Self {
        let request_timeout = Duration::from_millis(orchestrator.config().request_timeout_ms);
        Self {
            orchestrator,
            request_timeout,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn load_config(opts: &RuntimeOptions) -> ApiResult<QuarryConfig> {
        let config = match (&opts.config_toml, &opts.config_path) {
            (Some(raw), _) => {
                let mut config = QuarryConfig::from_toml_str(raw)?;
                config.apply_env(|key| std::env::var(key).ok());
                config.validate()?;
                config
            }
            (None, Some(path)) => QuarryConfig::load(path)?,
            (None, None) => {
                let mut config = QuarryConfig::default();
                config.apply_env(|key| std::env::var(key).ok());
                config.validate()?;
                config
            }
        };
        Ok(config)
    }
}
