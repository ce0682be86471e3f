/// Historical user feedback per document.
pub trait IFeedbackSource: Send + Sync {
    /// Upvote ratio in [0.0, 1.0], or `None` when the document has no history.
    fn feedback_ratio(&self, document_id: &str) -> Option<f64>;
}

/// Feedback source with no history for any document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl IFeedbackSource for NoFeedback {
    fn feedback_ratio(&self, _document_id: &str) -> Option<f64> {
        None
    }
}
