use crate::errors::BackendError;

/// Turns query text into a vector for similarity backends.
pub trait IQueryEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;

    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}
