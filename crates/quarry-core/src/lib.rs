//! # quarry-core
//!
//! Foundation crate for the Quarry retrieval orchestrator.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod text;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::QuarryConfig;
pub use errors::{BackendError, ErrorCategory, OrchestrationError, QuarryError, QuarryResult};
pub use models::{
    BackendKind, BackendStatus, Candidate, Factor, Query, QueryContext, ScoredCandidate,
    SearchResponse,
};
