//! # quarry-api
//!
//! Client-facing request and response shapes for the three exposed
//! operations (search, metrics read, metrics reset) and the runtime that
//! owns the orchestrator they run against.

pub mod errors;
pub mod handlers;
pub mod runtime;
pub mod types;

pub use errors::{ApiError, ApiResult, ErrorBody};
pub use runtime::{QuarryRuntime, RuntimeOptions};
pub use types::{
    FeatureFlags, MetricsRequest, MetricsResponse, MetricsSummary, ResetOutcome, ResetRequest,
    ResetResponse, ResetTarget, SearchApiResponse, SearchHit, SearchMetadata, SearchRequest,
};
