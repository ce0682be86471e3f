//! # quarry-backends
//!
//! One [`IBackendAdapter`](quarry_core::traits::IBackendAdapter) per backend
//! kind. Adapters make exactly one call per `search`, validate the payload
//! they receive, and classify every failure into an
//! [`ErrorCategory`](quarry_core::errors::ErrorCategory). Retry and circuit
//! breaking live in `quarry-resilience`.

pub mod embedder;
pub mod factory;
pub mod filters;
pub mod hosted_index;
pub mod in_memory;
pub mod relational_vector;

pub use embedder::HashingEmbedder;
pub use factory::build_adapters;
pub use hosted_index::HostedIndexAdapter;
pub use in_memory::{InMemoryAdapter, StoredDocument};
pub use relational_vector::RelationalVectorAdapter;
