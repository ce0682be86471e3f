mod backend_kind;
mod candidate;
mod circuit;
mod metric_event;
mod query;
mod response;
mod scored_candidate;
mod service_metrics;

pub use backend_kind::BackendKind;
pub use candidate::{Candidate, Metadata};
pub use circuit::{CircuitSnapshot, CircuitStatus};
pub use metric_event::{MetricEvent, MetricKind};
pub use query::{ComplexityTier, ConversationTurn, Query, QueryContext};
pub use response::{BackendStatus, SearchResponse};
pub use scored_candidate::{Factor, ScoredCandidate};
pub use service_metrics::ServiceMetrics;
