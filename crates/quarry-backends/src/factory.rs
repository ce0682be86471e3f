//! Build the enabled adapters from configuration.

use std::sync::Arc;

use quarry_core::config::BackendsConfig;
use quarry_core::errors::ConfigError;
use quarry_core::traits::IBackendAdapter;
use tracing::info;

use crate::{HashingEmbedder, HostedIndexAdapter, InMemoryAdapter, RelationalVectorAdapter};

/// One adapter per enabled backend, in `BackendKind` order.
pub fn build_adapters(config: &BackendsConfig) -> Result<Vec<Arc<dyn IBackendAdapter>>, ConfigError> {
    let mut adapters: Vec<Arc<dyn IBackendAdapter>> = Vec::new();

    if config.hosted_index.enabled {
        adapters.push(Arc::new(HostedIndexAdapter::new(&config.hosted_index)?));
    }

    if config.relational_vector.enabled {
        let rv = &config.relational_vector;
        let embedder = Arc::new(HashingEmbedder::new(rv.embedding_dimensions));
        let adapter = RelationalVectorAdapter::open(&rv.db_path, embedder)
            .map_err(|e| ConfigError::invalid("backends.relational_vector.db_path", e.to_string()))?;
        adapters.push(Arc::new(adapter));
    }

    if config.in_memory.enabled {
        let adapter = match &config.in_memory.seed_path {
            Some(path) => InMemoryAdapter::from_seed_file(path)?,
            None => InMemoryAdapter::new(),
        };
        adapters.push(Arc::new(adapter));
    }

    for a in &adapters {
        info!(backend = %a.kind(), adapter = a.name(), "backend adapter ready");
    }
    Ok(adapters)
}
