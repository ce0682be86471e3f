//! Search handler: request-level timeout, response shaping, output validation.

use quarry_core::errors::{OrchestrationError, TimeoutScope};
use quarry_core::models::Factor;
use quarry_orchestrator::SearchOptions;
use tokio::time::Instant;
use tracing::warn;

use crate::errors::{ApiError, ApiResult};
use crate::runtime::QuarryRuntime;
use crate::types::{FeatureFlags, SearchApiResponse, SearchHit, SearchMetadata, SearchRequest};

impl QuarryRuntime {
    /// Run one search under the client-facing request timeout.
    ///
    /// The fan-out deadline inside the orchestrator is separate; this bound
    /// also covers cache waits and ranking.
    pub async fn search(&self, request: SearchRequest) -> ApiResult<SearchApiResponse> {
        let (query, options) = request.into_parts()?;
        let features = self.features(&options)?;
        let started = Instant::now();

        let response = match tokio::time::timeout(
            self.request_timeout(),
            self.orchestrator().search_with(&query, &options),
        )
        .await
        {
            Ok(outcome) => outcome?,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(elapsed_ms, "search exceeded request timeout");
                return Err(OrchestrationError::Timeout {
                    scope: TimeoutScope::Request,
                    elapsed_ms,
                }
                .into());
            }
        };

        let results: Vec<SearchHit> = response.results.into_iter().map(SearchHit::from).collect();
        for hit in &results {
            hit.check().map_err(ApiError::MalformedResponse)?;
        }

        Ok(SearchApiResponse {
            search_metadata: SearchMetadata {
                request_id: response.request_id,
                cached: response.from_cache,
                coalesced: response.coalesced,
                total_response_time_ms: started.elapsed().as_millis() as u64,
                result_count: results.len(),
                features,
                per_backend_status: response.per_backend_status,
            },
            results,
        })
    }

    fn features(&self, options: &SearchOptions) -> ApiResult<FeatureFlags> {
        let scorer = self.orchestrator().scorer();
        let scoring = options
            .scoring(scorer.config())
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let weights = scorer.effective_weights(&scoring);
        Ok(FeatureFlags {
            relevance_scoring: options.enable_relevance_scoring,
            cross_encoder: weights.get(Factor::SemanticMatch) > 0.0,
            diversification: options.enable_diversification,
        })
    }
}
