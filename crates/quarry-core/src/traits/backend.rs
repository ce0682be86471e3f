use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::models::{BackendKind, Candidate, Query};

/// Arguments passed to every adapter call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub text: String,
    pub max_results: usize,
    pub threshold: f64,
    pub filters: BTreeMap<String, String>,
}

impl BackendRequest {
    pub fn from_query(query: &Query) -> Self {
        Self {
            text: query.text.clone(),
            max_results: query.max_results,
            threshold: query.threshold,
            filters: query.filters.clone(),
        }
    }
}

/// Uniform interface over one concrete retrieval backend.
///
/// Implementations validate their own wire or row payloads and report
/// malformed data as `Permanent`.
#[async_trait]
pub trait IBackendAdapter: Send + Sync {
    /// Which backend this adapter serves.
    fn kind(&self) -> BackendKind;

    /// Human-readable adapter name for logs.
    fn name(&self) -> &str;

    /// Run one search. Never retried internally.
    async fn search(&self, request: &BackendRequest) -> Result<Vec<Candidate>, BackendError>;
}
