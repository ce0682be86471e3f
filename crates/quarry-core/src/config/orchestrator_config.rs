use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::BackendKind;

/// Fan-out and merge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Shared deadline for every backend branch of one search (milliseconds).
    pub fanout_deadline_ms: u64,
    /// Client-facing timeout for a whole search request (milliseconds).
    pub request_timeout_ms: u64,
    /// Backend queried when a requested backend fails. `None` disables fallback.
    pub fallback_backend: Option<BackendKind>,
    /// Collapse identical content returned by different backends.
    pub dedup_by_content: bool,
}

impl OrchestratorConfig {
    pub fn fanout_deadline(&self) -> Duration {
        Duration::from_millis(self.fanout_deadline_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fanout_deadline_ms: defaults::DEFAULT_FANOUT_DEADLINE_MS,
            request_timeout_ms: defaults::DEFAULT_REQUEST_TIMEOUT_MS,
            fallback_backend: defaults::DEFAULT_FALLBACK_BACKEND.parse().ok(),
            dedup_by_content: defaults::DEFAULT_DEDUP_BY_CONTENT,
        }
    }
}
