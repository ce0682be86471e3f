//! Hosted file-search index adapter (vector store search over HTTP).
//!
//! `POST {base_url}/vector_stores/{store_id}/search`, bearer-authenticated,
//! gzip-enabled. Status mapping: 429 → RateLimited, 5xx / timeout / connect
//! failure → Transient, other 4xx → Permanent, undecodable body → Permanent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use quarry_core::config::HostedIndexConfig;
use quarry_core::errors::{BackendError, ConfigError};
use quarry_core::models::{BackendKind, Candidate, Metadata};
use quarry_core::traits::{BackendRequest, IBackendAdapter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wire types for the search endpoint.
mod wire {
    use super::*;

    #[derive(Debug, Serialize)]
    pub struct SearchBody<'a> {
        pub query: &'a str,
        pub max_num_results: usize,
        pub ranking_options: RankingOptions,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub filters: Option<serde_json::Value>,
    }

    #[derive(Debug, Serialize)]
    pub struct RankingOptions {
        pub score_threshold: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchPage {
        pub data: Vec<SearchHit>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchHit {
        pub file_id: String,
        #[serde(default)]
        pub filename: String,
        pub score: f64,
        #[serde(default)]
        pub content: Vec<ContentPart>,
        #[serde(default)]
        pub attributes: Option<BTreeMap<String, serde_json::Value>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ContentPart {
        #[serde(rename = "type")]
        pub kind: String,
        #[serde(default)]
        pub text: String,
    }
}

/// Adapter for the hosted vector-store search API.
#[derive(Debug, Clone)]
pub struct HostedIndexAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HostedIndexAdapter {
    pub fn new(config: &HostedIndexConfig) -> Result<Self, ConfigError> {
        if config.store_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                "backends.hosted_index.store_id",
                "required when the hosted index is enabled",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .build()
            .map_err(|e| ConfigError::invalid("backends.hosted_index", e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/vector_stores/{}/search",
                config.base_url.trim_end_matches('/'),
                config.store_id
            ),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IBackendAdapter for HostedIndexAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::HostedIndex
    }

    fn name(&self) -> &str {
        "hosted-index"
    }

    async fn search(&self, request: &BackendRequest) -> Result<Vec<Candidate>, BackendError> {
        let body = wire::SearchBody {
            query: &request.text,
            max_num_results: request.max_results,
            ranking_options: wire::RankingOptions {
                score_threshold: request.threshold,
            },
            filters: filter_expression(&request.filters),
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(classify_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let raw = resp.text().await.map_err(classify_transport)?;
        let candidates = decode_page(&raw)?;
        debug!(backend = "hosted_index", hits = candidates.len(), "hosted index responded");
        Ok(candidates)
    }
}

/// Comparison filter for one key, compound `and` for several.
fn filter_expression(filters: &BTreeMap<String, String>) -> Option<serde_json::Value> {
    let mut clauses: Vec<serde_json::Value> = filters
        .iter()
        .map(|(key, value)| serde_json::json!({ "type": "eq", "key": key, "value": value }))
        .collect();
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(serde_json::json!({ "type": "and", "filters": clauses })),
    }
}

/// Map a non-success HTTP status to an error category.
pub fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let message = format!("HTTP {status}: {}", truncate(body, 200));
    if status == StatusCode::TOO_MANY_REQUESTS {
        BackendError::rate_limited(message)
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        BackendError::transient(message)
    } else {
        BackendError::permanent(message)
    }
}

fn classify_transport(e: reqwest::Error) -> BackendError {
    if e.is_builder() {
        BackendError::permanent(format!("invalid request: {e}"))
    } else if e.is_decode() {
        BackendError::malformed("response body", e)
    } else {
        // timeout, connect, reset, and body read failures
        BackendError::transient(e.to_string())
    }
}

/// Decode and validate a search page into candidates.
pub fn decode_page(raw: &str) -> Result<Vec<Candidate>, BackendError> {
    let page: wire::SearchPage =
        serde_json::from_str(raw).map_err(|e| BackendError::malformed("search page", e))?;

    page.data
        .into_iter()
        .map(|hit| {
            let content = hit
                .content
                .iter()
                .filter(|part| part.kind == "text")
                .map(|part| part.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let source_name = if hit.filename.is_empty() {
                hit.file_id.clone()
            } else {
                hit.filename
            };
            let candidate = Candidate {
                backend: BackendKind::HostedIndex,
                document_id: hit.file_id,
                source_name,
                raw_score: hit.score,
                content,
                metadata: hit.attributes.unwrap_or_else(Metadata::new),
            };
            candidate.validate()?;
            Ok(candidate)
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::errors::ErrorCategory;

    #[test]
    fn status_mapping() {
        let cat = |code: u16| {
            classify_status(StatusCode::from_u16(code).unwrap(), "").category
        };
        assert_eq!(cat(429), ErrorCategory::RateLimited);
        assert_eq!(cat(500), ErrorCategory::Transient);
        assert_eq!(cat(503), ErrorCategory::Transient);
        assert_eq!(cat(401), ErrorCategory::Permanent);
        assert_eq!(cat(404), ErrorCategory::Permanent);
        assert_eq!(cat(400), ErrorCategory::Permanent);
    }

    #[test]
    fn decodes_hits_joining_text_parts() {
        let raw = r#"{"data":[{"file_id":"file-1","filename":"manual.pdf","score":0.82,
            "content":[{"type":"text","text":"Step 1"},{"type":"image","text":""},{"type":"text","text":"Step 2"}],
            "attributes":{"domain":"metrology"}}]}"#;
        let hits = decode_page(raw).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, "file-1");
        assert_eq!(hits[0].source_name, "manual.pdf");
        assert_eq!(hits[0].content, "Step 1\nStep 2");
        assert_eq!(hits[0].metadata["domain"], "metrology");
    }

    #[test]
    fn malformed_pages_are_permanent() {
        assert_eq!(
            decode_page("not json").unwrap_err().category,
            ErrorCategory::Permanent
        );
        let empty_content = r#"{"data":[{"file_id":"f","score":0.5,"content":[]}]}"#;
        assert_eq!(
            decode_page(empty_content).unwrap_err().category,
            ErrorCategory::Permanent
        );
    }

    #[test]
    fn filters_become_eq_or_and_expressions() {
        let mut f = BTreeMap::new();
        assert!(filter_expression(&f).is_none());
        f.insert("domain".to_string(), "lab".to_string());
        assert_eq!(filter_expression(&f).unwrap()["type"], "eq");
        f.insert("owner".to_string(), "ops".to_string());
        let expr = filter_expression(&f).unwrap();
        assert_eq!(expr["type"], "and");
        assert_eq!(expr["filters"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn requires_store_id() {
        assert!(HostedIndexAdapter::new(&HostedIndexConfig::default()).is_err());
        let cfg = HostedIndexConfig {
            store_id: "vs_1".into(),
            base_url: "http://localhost:9/v1/".into(),
            ..HostedIndexConfig::default()
        };
        let a = HostedIndexAdapter::new(&cfg).unwrap();
        assert_eq!(a.endpoint(), "http://localhost:9/v1/vector_stores/vs_1/search");
    }
}
