//! Handlers for the exposed operations, as methods on [`QuarryRuntime`](crate::QuarryRuntime).

mod metrics;
mod search;
