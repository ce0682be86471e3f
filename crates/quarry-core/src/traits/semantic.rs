/// Secondary query/passage similarity signal (cross-encoder style).
pub trait ISemanticMatcher: Send + Sync {
    /// Similarity in [0.0, 1.0].
    fn score(&self, query: &str, content: &str) -> f64;

    fn name(&self) -> &str;
}
