//! The search pipeline: fingerprint → cache / single-flight → concurrent
//! fan-out under one deadline → fallback → merge → score → diversify.
//!
//! Merge only starts after every branch has returned or missed the
//! deadline. The invoker is handed the same deadline and settles its own
//! breaker permit as a Timeout when a call is still pending. A branch task
//! still alive after the deadline is aborted, which releases any
//! half-open permit it holds.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use quarry_core::config::{OrchestratorConfig, QuarryConfig};
use quarry_core::errors::{
    BackendFailure, ConfigError, ErrorCategory, OrchestrationError, TimeoutScope,
};
use quarry_core::models::{BackendKind, BackendStatus, Candidate, Query, SearchResponse};
use quarry_core::traits::{BackendRequest, IBackendAdapter, IFeedbackSource, ISemanticMatcher};
use quarry_observability::tracing_setup::events;
use quarry_observability::{HealthReport, HealthReporter, MetricsReading, MetricsStore, TimeRange};
use quarry_ranking::{Diversifier, RelevanceScorer, ScoringOptions};
use quarry_resilience::{CircuitRegistry, Invocation, ResilientInvoker, RetryPolicy};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::{CacheOutcome, ResultCache};
use crate::fingerprint::Fingerprint;
use crate::merge;
use crate::options::SearchOptions;

/// Outcome of one fan-out branch.
enum Branch {
    Done(Invocation),
    TimedOut,
    Aborted(String),
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    adapters: BTreeMap<BackendKind, Arc<dyn IBackendAdapter>>,
    invoker: Arc<ResilientInvoker>,
    scorer: Arc<RelevanceScorer>,
    diversifier: Diversifier,
    cache: ResultCache,
}

/// Assembles an [`Orchestrator`] with its owned metrics store and breakers.
pub struct OrchestratorBuilder {
    config: QuarryConfig,
    adapters: Vec<Arc<dyn IBackendAdapter>>,
    feedback: Option<Arc<dyn IFeedbackSource>>,
    semantic: Option<Arc<dyn ISemanticMatcher>>,
    metrics: Option<Arc<MetricsStore>>,
    circuits: Option<Arc<CircuitRegistry>>,
}

impl OrchestratorBuilder {
    pub fn new(config: QuarryConfig) -> Self {
        Self {
            config,
            adapters: Vec::new(),
            feedback: None,
            semantic: None,
            metrics: None,
            circuits: None,
        }
    }

    pub fn adapter(mut self, adapter: Arc<dyn IBackendAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn IBackendAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn feedback(mut self, feedback: Arc<dyn IFeedbackSource>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn semantic_matcher(mut self, matcher: Arc<dyn ISemanticMatcher>) -> Self {
        self.semantic = Some(matcher);
        self
    }

    /// Share an existing metrics store instead of creating one.
    pub fn metrics(mut self, metrics: Arc<MetricsStore>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Share an existing breaker registry instead of creating one.
    pub fn circuits(mut self, circuits: Arc<CircuitRegistry>) -> Self {
        self.circuits = Some(circuits);
        self
    }

    pub fn build(self) -> Result<Orchestrator, ConfigError> {
        self.config.validate()?;
        let QuarryConfig {
            retry,
            circuit_breaker,
            orchestrator,
            cache,
            scoring,
            metrics,
            ..
        } = self.config;

        let mut adapters: BTreeMap<BackendKind, Arc<dyn IBackendAdapter>> = BTreeMap::new();
        for adapter in self.adapters {
            let kind = adapter.kind();
            if adapters.insert(kind, adapter).is_some() {
                return Err(ConfigError::invalid(
                    "backends",
                    format!("more than one adapter registered for {kind}"),
                ));
            }
        }

        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(MetricsStore::new(&metrics)));
        let circuits = self
            .circuits
            .unwrap_or_else(|| Arc::new(CircuitRegistry::new(circuit_breaker)));
        for kind in adapters.keys() {
            circuits.register(*kind);
        }

        let invoker = Arc::new(ResilientInvoker::new(
            RetryPolicy::new(retry),
            circuits,
            metrics,
            orchestrator.fallback_backend,
        ));

        let diversifier = Diversifier::from_config(&scoring);
        let mut scorer = RelevanceScorer::new(scoring);
        if let Some(feedback) = self.feedback {
            scorer = scorer.with_feedback(feedback);
        }
        if let Some(matcher) = self.semantic {
            scorer = scorer.with_semantic_matcher(matcher);
        }

        Ok(Orchestrator {
            config: orchestrator,
            adapters,
            invoker,
            scorer: Arc::new(scorer),
            diversifier,
            cache: ResultCache::new(&cache),
        })
    }
}

impl Orchestrator {
    pub fn builder(config: QuarryConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsStore> {
        self.invoker.metrics()
    }

    pub fn circuits(&self) -> &Arc<CircuitRegistry> {
        self.invoker.circuits()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn registered_backends(&self) -> BTreeSet<BackendKind> {
        self.adapters.keys().copied().collect()
    }

    /// Health of every registered backend from live metrics and breaker state.
    pub fn health(&self, range: TimeRange) -> HealthReport {
        let readings: BTreeMap<BackendKind, MetricsReading> = self
            .adapters
            .keys()
            .map(|kind| {
                (
                    *kind,
                    MetricsReading::Available(self.metrics().snapshot(Some(*kind), range)),
                )
            })
            .collect();
        HealthReporter::build(&readings, &self.circuits().snapshot())
    }

    /// Search with the configured ranking behavior.
    pub async fn search(&self, query: &Query) -> Result<SearchResponse, OrchestrationError> {
        self.search_with(query, &SearchOptions::default()).await
    }

    /// Search with per-request ranking overrides.
    pub async fn search_with(
        &self,
        query: &Query,
        options: &SearchOptions,
    ) -> Result<SearchResponse, OrchestrationError> {
        query.validate()?;
        let scoring = options
            .scoring(self.scorer.config())
            .map_err(|e| OrchestrationError::invalid_query(e.to_string()))?;

        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let span = quarry_observability::search_span!(request_id, query.sources);

        async move {
            let key = Fingerprint::of(query, options);
            let (outcome, how) = self
                .cache
                .get_or_compute(key.clone(), || {
                    self.execute(query, options, scoring, request_id)
                })
                .await;

            let mut response = outcome?;
            match how {
                CacheOutcome::Computed => {}
                CacheOutcome::Hit => {
                    events::cache_hit(key.as_str());
                    response.from_cache = true;
                    response.coalesced = false;
                }
                CacheOutcome::Coalesced => {
                    response.from_cache = false;
                    response.coalesced = true;
                }
            }
            response.request_id = request_id;
            response.elapsed_ms = started.elapsed().as_millis() as u64;
            Ok(response)
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        query: &Query,
        options: &SearchOptions,
        scoring: ScoringOptions,
        request_id: Uuid,
    ) -> Result<SearchResponse, OrchestrationError> {
        let started = Instant::now();
        let deadline = started + self.config.fanout_deadline();
        let request = BackendRequest::from_query(query);

        let mut statuses: BTreeMap<BackendKind, BackendStatus> = BTreeMap::new();
        let mut lists: Vec<Vec<Candidate>> = Vec::new();

        let mut branches = Vec::new();
        for kind in &query.sources {
            match self.adapters.get(kind) {
                Some(adapter) => {
                    branches.push(self.branch(Arc::clone(adapter), request.clone(), deadline))
                }
                None => {
                    statuses.insert(
                        *kind,
                        BackendStatus::failed(0, 0, ErrorCategory::Permanent, "no adapter registered"),
                    );
                }
            }
        }

        for (kind, branch) in join_all(branches).await {
            let (status, candidates) = self.settle(kind, branch, started);
            statuses.insert(kind, status);
            lists.extend(candidates);
        }

        if let Some((kind, mut status, candidates)) =
            self.run_fallback(query, &statuses, &request, deadline, started).await
        {
            status.fallback = true;
            statuses.insert(kind, status);
            lists.extend(candidates);
        }

        if !statuses.values().any(|s| s.ok) {
            let failures = statuses
                .iter()
                .map(|(backend, s)| BackendFailure {
                    backend: *backend,
                    category: s.category.unwrap_or(ErrorCategory::Transient),
                    message: s.error.clone().unwrap_or_default(),
                })
                .collect();
            return Err(OrchestrationError::AllBackendsUnavailable { failures });
        }

        let merged = merge::merge(lists);
        let mut ranked = self.scorer.score_all(merged, query, &scoring, Utc::now());
        if self.config.dedup_by_content {
            ranked = merge::dedup_by_content(ranked);
        }
        ranked.retain(|s| s.relevance_score >= query.threshold);
        let results = if options.enable_diversification {
            self.diversifier.diversify(ranked, query.max_results)
        } else {
            ranked.truncate(query.max_results);
            ranked
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        events::search_completed(
            results.len(),
            statuses.values().filter(|s| s.ok).count(),
            statuses.len(),
            elapsed_ms,
        );

        Ok(SearchResponse {
            request_id,
            results,
            per_backend_status: statuses,
            from_cache: false,
            coalesced: false,
            elapsed_ms,
        })
    }

    /// Spawn one invocation and bound it by the shared deadline.
    fn branch(
        &self,
        adapter: Arc<dyn IBackendAdapter>,
        request: BackendRequest,
        deadline: Instant,
    ) -> impl Future<Output = (BackendKind, Branch)> {
        let kind = adapter.kind();
        let invoker = Arc::clone(&self.invoker);
        let handle = tokio::spawn(async move {
            invoker
                .invoke_until(adapter.as_ref(), &request, deadline)
                .await
        });
        let abort = handle.abort_handle();
        async move {
            let branch = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(invocation)) => Branch::Done(invocation),
                Ok(Err(join)) => Branch::Aborted(join.to_string()),
                Err(_) => {
                    abort.abort();
                    Branch::TimedOut
                }
            };
            (kind, branch)
        }
    }

    fn settle(
        &self,
        kind: BackendKind,
        branch: Branch,
        started: Instant,
    ) -> (BackendStatus, Option<Vec<Candidate>>) {
        match branch {
            Branch::Done(inv) => {
                let latency_ms = inv.latency_ms();
                match inv.result {
                    Ok(candidates) => (
                        BackendStatus::succeeded(latency_ms, candidates.len(), inv.attempts),
                        Some(candidates),
                    ),
                    Err(e) => (
                        BackendStatus::failed(latency_ms, inv.attempts, e.category(), e.to_string()),
                        None,
                    ),
                }
            }
            Branch::TimedOut => {
                let deadline_ms = self.config.fanout_deadline_ms;
                events::fanout_timeout(kind, deadline_ms);
                let err = OrchestrationError::Timeout {
                    scope: TimeoutScope::FanOut,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                (
                    BackendStatus::failed(deadline_ms, 0, ErrorCategory::Timeout, err.to_string()),
                    None,
                )
            }
            Branch::Aborted(reason) => (
                BackendStatus::failed(
                    started.elapsed().as_millis() as u64,
                    0,
                    ErrorCategory::Transient,
                    format!("backend task aborted: {reason}"),
                ),
                None,
            ),
        }
    }

    /// One extra call to the fallback backend when a requested backend
    /// failed, the fallback was not requested itself, and its breaker admits calls.
    async fn run_fallback(
        &self,
        query: &Query,
        statuses: &BTreeMap<BackendKind, BackendStatus>,
        request: &BackendRequest,
        deadline: Instant,
        started: Instant,
    ) -> Option<(BackendKind, BackendStatus, Option<Vec<Candidate>>)> {
        let fallback = self.config.fallback_backend?;
        if query.sources.contains(&fallback) || statuses.values().all(|s| s.ok) {
            return None;
        }
        let adapter = self.adapters.get(&fallback)?;
        let admits = self
            .circuits()
            .get(fallback)
            .map_or(true, |b| !b.is_rejecting());
        if !admits || Instant::now() >= deadline {
            return None;
        }

        let (kind, branch) = self
            .branch(Arc::clone(adapter), request.clone(), deadline)
            .await;
        let (status, candidates) = self.settle(kind, branch, started);
        Some((kind, status, candidates))
    }
}
