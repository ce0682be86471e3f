//! # quarry-orchestrator
//!
//! Accepts a [`Query`](quarry_core::models::Query), fans it out concurrently
//! to every requested backend through the resilient invoker under one shared
//! deadline, merges and ranks the surviving candidates, and caches
//! successful responses with single-flight coalescing of identical requests.

pub mod cache;
pub mod fingerprint;
pub mod merge;
pub mod options;
pub mod orchestrator;

pub use cache::{CacheOutcome, ResultCache};
pub use fingerprint::Fingerprint;
pub use options::SearchOptions;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
