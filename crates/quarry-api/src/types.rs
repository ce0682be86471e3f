//! Wire shapes for the exposed operations. Field names are camelCase on the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quarry_core::config::WeightOverrides;
use quarry_core::models::{
    BackendKind, BackendStatus, Metadata, Query, QueryContext, ScoredCandidate, ServiceMetrics,
};
use quarry_observability::{MetricsReading, TimeRange};
use quarry_orchestrator::SearchOptions;

use crate::errors::{ApiError, ApiResult};

// ── Search ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub query: String,
    /// Backend names. Empty selects every backend.
    pub sources: Vec<String>,
    pub max_results: Option<usize>,
    pub threshold: Option<f64>,
    pub filters: BTreeMap<String, String>,
    pub context: Option<QueryContext>,
    pub weights: WeightOverrides,
    pub enable_relevance_scoring: Option<bool>,
    pub enable_cross_encoder: Option<bool>,
    pub enable_diversification: Option<bool>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Split into the orchestrator's query and per-request options.
    pub fn into_parts(self) -> ApiResult<(Query, SearchOptions)> {
        let mut query = Query::new(self.query);
        if !self.sources.is_empty() {
            let sources = self
                .sources
                .iter()
                .map(|name| name.parse::<BackendKind>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApiError::InvalidRequest)?;
            query = query.with_sources(sources);
        }
        if let Some(max) = self.max_results {
            query = query.with_max_results(max);
        }
        if let Some(threshold) = self.threshold {
            query = query.with_threshold(threshold);
        }
        query.filters = self.filters;
        query.context = self.context.map(QueryContext::bounded);

        let defaults = SearchOptions::default();
        let options = SearchOptions {
            weights: self.weights,
            enable_relevance_scoring: self
                .enable_relevance_scoring
                .unwrap_or(defaults.enable_relevance_scoring),
            enable_cross_encoder: self.enable_cross_encoder,
            enable_diversification: self
                .enable_diversification
                .unwrap_or(defaults.enable_diversification),
        };
        Ok((query, options))
    }
}

/// One ranked document as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub source: String,
    pub backend: BackendKind,
    pub content: String,
    pub similarity: f64,
    pub relevance_score: f64,
    pub score_breakdown: BTreeMap<String, f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<ScoredCandidate> for SearchHit {
    fn from(scored: ScoredCandidate) -> Self {
        let similarity = scored.similarity();
        let score_breakdown = scored
            .score_breakdown
            .iter()
            .map(|(factor, value)| (factor.as_str().to_string(), *value))
            .collect();
        let c = scored.candidate;
        Self {
            id: c.document_id,
            source: c.source_name,
            backend: c.backend,
            content: c.content,
            similarity,
            relevance_score: scored.relevance_score,
            score_breakdown,
            metadata: c.metadata,
        }
    }
}

impl SearchHit {
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("hit with empty id".into());
        }
        if self.content.trim().is_empty() {
            return Err(format!("hit {} has empty content", self.id));
        }
        if !self.relevance_score.is_finite() || !(0.0..=1.0).contains(&self.relevance_score) {
            return Err(format!(
                "hit {} has relevance {} outside [0, 1]",
                self.id, self.relevance_score
            ));
        }
        Ok(())
    }
}

/// Effective feature switches for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub relevance_scoring: bool,
    pub cross_encoder: bool,
    pub diversification: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub request_id: Uuid,
    pub cached: bool,
    pub coalesced: bool,
    pub total_response_time_ms: u64,
    pub result_count: usize,
    pub features: FeatureFlags,
    pub per_backend_status: BTreeMap<BackendKind, BackendStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchApiResponse {
    pub results: Vec<SearchHit>,
    pub search_metadata: SearchMetadata,
}

// ── Metrics read ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsRequest {
    /// Backend names. Empty selects every registered backend.
    pub backends: Vec<String>,
    pub time_range: TimeRange,
    pub include_details: bool,
}

/// Aggregate over every backend whose metrics could be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub overall_success_rate: f64,
    pub overall_error_rate: f64,
    pub total_retries: u64,
    pub total_fallbacks: u64,
    pub average_latency: f64,
    pub unavailable_backends: usize,
}

impl MetricsSummary {
    pub(crate) fn from_readings<'a>(readings: impl IntoIterator<Item = &'a MetricsReading>) -> Self {
        let mut combined = ServiceMetrics::default();
        let mut unavailable = 0;
        for reading in readings {
            match reading.metrics() {
                Some(m) => combined.absorb(m),
                None => unavailable += 1,
            }
        }
        Self {
            total_requests: combined.total_requests,
            overall_success_rate: combined.success_rate,
            overall_error_rate: combined.error_rate,
            total_retries: combined.retried_requests,
            total_fallbacks: combined.fallback_activations,
            average_latency: combined.average_latency_ms,
            unavailable_backends: unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub time_range: TimeRange,
    pub generated_at: DateTime<Utc>,
    pub summary: MetricsSummary,
    /// Per-backend readings, keyed by the requested name. Present only with `includeDetails`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<BTreeMap<String, MetricsReading>>,
}

// ── Metrics reset ───────────────────────────────────────────────────────

/// Either the literal `"all"` or a list of backend names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResetTarget {
    Named(Vec<String>),
    Keyword(String),
}

impl Default for ResetTarget {
    fn default() -> Self {
        Self::Keyword("all".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetRequest {
    pub backends: ResetTarget,
    /// Also close the circuit breakers of the selected backends.
    pub reset_circuits: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub reset: bool,
    pub events_cleared: usize,
    pub circuit_reset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub outcomes: BTreeMap<String, ResetOutcome>,
}
