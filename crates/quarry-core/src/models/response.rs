use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BackendKind, ScoredCandidate};
use crate::errors::ErrorCategory;

/// Per-backend outcome for one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub ok: bool,
    pub latency_ms: u64,
    pub result_count: usize,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// Called as a fallback for another failed backend.
    #[serde(default)]
    pub fallback: bool,
}

impl BackendStatus {
    pub fn succeeded(latency_ms: u64, result_count: usize, attempts: u32) -> Self {
        Self {
            ok: true,
            latency_ms,
            result_count,
            attempts,
            error: None,
            category: None,
            fallback: false,
        }
    }

    pub fn failed(
        latency_ms: u64,
        attempts: u32,
        category: ErrorCategory,
        error: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            latency_ms,
            result_count: 0,
            attempts,
            error: Some(error.into()),
            category: Some(category),
            fallback: false,
        }
    }
}

/// Ranked results plus per-backend provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request_id: Uuid,
    pub results: Vec<ScoredCandidate>,
    pub per_backend_status: BTreeMap<BackendKind, BackendStatus>,
    pub from_cache: bool,
    /// Served by another in-flight request with the same fingerprint.
    #[serde(default)]
    pub coalesced: bool,
    pub elapsed_ms: u64,
}

impl SearchResponse {
    /// Backends that answered successfully.
    pub fn healthy_backends(&self) -> Vec<BackendKind> {
        self.per_backend_status
            .iter()
            .filter(|(_, s)| s.ok)
            .map(|(k, _)| *k)
            .collect()
    }
}
