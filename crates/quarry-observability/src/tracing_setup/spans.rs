//! Span definitions per operation: search, backend call.

/// Create a search span.
#[macro_export]
macro_rules! search_span {
    ($request_id:expr, $sources:expr) => {
        tracing::info_span!("quarry.search", request_id = %$request_id, sources = ?$sources)
    };
}

/// Create a backend call span.
#[macro_export]
macro_rules! backend_span {
    ($backend:expr) => {
        tracing::debug_span!("quarry.backend", backend = %$backend)
    };
}
