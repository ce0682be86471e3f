use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Hosted file-search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedIndexConfig {
    pub enabled: bool,
    pub base_url: String,
    pub store_id: String,
    /// Usually injected from `QUARRY_HOSTED_INDEX_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl HostedIndexConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HostedIndexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: defaults::DEFAULT_HOSTED_INDEX_BASE_URL.to_string(),
            store_id: String::new(),
            api_key: None,
            request_timeout_ms: defaults::DEFAULT_HOSTED_INDEX_TIMEOUT_MS,
        }
    }
}

/// Relational vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalVectorConfig {
    pub enabled: bool,
    pub db_path: String,
    pub embedding_dimensions: usize,
}

impl Default for RelationalVectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_path: defaults::DEFAULT_VECTOR_DB_FILENAME.to_string(),
            embedding_dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// In-process store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryConfig {
    pub enabled: bool,
    /// Optional JSON file of documents loaded at startup.
    pub seed_path: Option<String>,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed_path: None,
        }
    }
}

/// Settings for every backend kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub hosted_index: HostedIndexConfig,
    pub relational_vector: RelationalVectorConfig,
    pub in_memory: InMemoryConfig,
}
