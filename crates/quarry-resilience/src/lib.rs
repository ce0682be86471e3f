//! # quarry-resilience
//!
//! Failure isolation for retrieval backends: a pure [`RetryPolicy`], a
//! per-backend [`CircuitBreaker`] state machine kept in a [`CircuitRegistry`],
//! and the [`ResilientInvoker`] that composes both around an adapter call and
//! records every outcome into the metrics store.

pub mod circuit_breaker;
pub mod invoker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitPermit, CircuitRegistry, Transition};
pub use invoker::{Invocation, ResilientInvoker};
pub use retry::{RetryDecision, RetryPolicy};
