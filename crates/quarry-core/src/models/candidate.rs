use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::BackendKind;
use crate::constants::{META_CREATED_AT, META_DOMAIN, META_TAGS, META_TRUST_TIER, META_UPDATED_AT};
use crate::errors::BackendError;

/// Free-form candidate metadata. Ordered so serialized responses are stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// One retrieval hit produced by a backend adapter.
///
/// `raw_score` is on the backend's own scale and is only comparable across
/// backends after the scorer normalizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub backend: BackendKind,
    pub document_id: String,
    pub source_name: String,
    pub raw_score: f64,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Candidate {
    pub fn new(
        backend: BackendKind,
        document_id: impl Into<String>,
        source_name: impl Into<String>,
        raw_score: f64,
        content: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            document_id: document_id.into(),
            source_name: source_name.into(),
            raw_score,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Reject payloads that would otherwise propagate empty or non-finite fields.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.document_id.trim().is_empty() {
            return Err(BackendError::malformed("candidate", "empty document id"));
        }
        if !self.raw_score.is_finite() {
            return Err(BackendError::malformed(
                "candidate",
                format!("non-finite score for {}", self.document_id),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(BackendError::malformed(
                "candidate",
                format!("empty content for {}", self.document_id),
            ));
        }
        Ok(())
    }

    /// Last update time from `updated_at`, falling back to `created_at`.
    ///
    /// Accepts RFC 3339 strings or epoch seconds.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        [META_UPDATED_AT, META_CREATED_AT]
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .find_map(parse_timestamp)
    }

    /// Tags from metadata: a string array or a comma-separated string, lowercased.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = match self.metadata.get(META_TAGS) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        };
        if let Some(domain) = self.metadata.get(META_DOMAIN).and_then(|v| v.as_str()) {
            tags.push(domain.trim().to_lowercase());
        }
        tags
    }

    /// Raw trust tier metadata, if any.
    pub fn trust_tier(&self) -> Option<&serde_json::Value> {
        self.metadata.get(META_TRUST_TIER)
    }
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
