mod backend;
mod embedder;
mod feedback;
mod semantic;

pub use backend::{BackendRequest, IBackendAdapter};
pub use embedder::IQueryEmbedder;
pub use feedback::{IFeedbackSource, NoFeedback};
pub use semantic::ISemanticMatcher;
