//! In-process document store with lexical term-overlap scoring.
//!
//! Always available, so it doubles as the default fallback backend.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use quarry_core::errors::{BackendError, ConfigError};
use quarry_core::models::{BackendKind, Candidate, Metadata};
use quarry_core::text::tokenize;
use quarry_core::traits::{BackendRequest, IBackendAdapter};
use serde::{Deserialize, Serialize};

use crate::filters;

/// Share of the score carried by query-term coverage; the rest is term frequency.
const COVERAGE_WEIGHT: f64 = 0.7;
/// Occurrences per query term at which the frequency boost saturates.
const TF_SATURATION: f64 = 3.0;

/// A document held by [`InMemoryAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub source_name: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, source_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_name: source_name.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Default)]
pub struct InMemoryAdapter {
    documents: RwLock<Vec<StoredDocument>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = StoredDocument>) -> Self {
        let adapter = Self::new();
        for doc in documents {
            adapter.insert(doc);
        }
        adapter
    }

    /// Load a JSON array of [`StoredDocument`]s.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let docs: Vec<StoredDocument> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseFailed {
                reason: format!("{}: {e}", path.display()),
            })?;
        Ok(Self::with_documents(docs))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<StoredDocument>> {
        self.documents.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<StoredDocument>> {
        self.documents.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace by id.
    pub fn insert(&self, doc: StoredDocument) {
        let mut docs = self.write();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut docs = self.write();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        docs.len() != before
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn score(query_terms: &HashSet<String>, content: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        for tok in tokenize(content) {
            if query_terms.contains(&tok) {
                *counts.entry(tok).or_default() += 1;
            }
        }
        if counts.is_empty() {
            return 0.0;
        }
        let n = query_terms.len() as f64;
        let coverage = counts.len() as f64 / n;
        let hits: usize = counts.values().sum();
        let tf_boost = (hits as f64 / (n * TF_SATURATION)).min(1.0);
        coverage * (COVERAGE_WEIGHT + (1.0 - COVERAGE_WEIGHT) * tf_boost)
    }
}

#[async_trait]
impl IBackendAdapter for InMemoryAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::InMemory
    }

    fn name(&self) -> &str {
        "in-memory"
    }

    async fn search(&self, request: &BackendRequest) -> Result<Vec<Candidate>, BackendError> {
        let terms: HashSet<String> = tokenize(&request.text).into_iter().collect();
        let docs = self.read();

        let mut hits: Vec<Candidate> = docs
            .iter()
            .filter(|d| filters::matches(&d.metadata, &request.filters))
            .filter_map(|d| {
                let score = Self::score(&terms, &d.content);
                (score > 0.0 && score >= request.threshold).then(|| Candidate {
                    backend: BackendKind::InMemory,
                    document_id: d.id.clone(),
                    source_name: d.source_name.clone(),
                    raw_score: score,
                    content: d.content.clone(),
                    metadata: d.metadata.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.raw_score
                .total_cmp(&a.raw_score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        hits.truncate(request.max_results);
        Ok(hits)
    }
}
