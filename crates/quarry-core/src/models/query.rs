use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::BackendKind;
use crate::constants::{MAX_CONTEXT_TURNS, MAX_PREVIOUS_QUERIES, MAX_RESULTS_LIMIT};
use crate::errors::OrchestrationError;

/// Complexity hint supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
}

/// One prior conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Optional ranking hints. Read by the relevance scorer only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryContext {
    pub domain: Option<String>,
    pub intent_tags: Vec<String>,
    pub complexity: Option<ComplexityTier>,
    pub user_id: Option<String>,
    /// Most recent turns last. Bounded to `MAX_CONTEXT_TURNS`.
    pub conversation: Vec<ConversationTurn>,
    /// Most recent queries last. Bounded to `MAX_PREVIOUS_QUERIES`.
    pub previous_queries: Vec<String>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_intent_tag(mut self, tag: impl Into<String>) -> Self {
        self.intent_tags.push(tag.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Append a turn, dropping the oldest beyond the window.
    pub fn push_turn(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.conversation.push(ConversationTurn {
            role: role.into(),
            content: content.into(),
        });
        let excess = self.conversation.len().saturating_sub(MAX_CONTEXT_TURNS);
        self.conversation.drain(..excess);
    }

    /// Append a previous query, dropping the oldest beyond the window.
    pub fn push_previous_query(&mut self, query: impl Into<String>) {
        self.previous_queries.push(query.into());
        let excess = self
            .previous_queries
            .len()
            .saturating_sub(MAX_PREVIOUS_QUERIES);
        self.previous_queries.drain(..excess);
    }

    /// Enforce the window bounds on a context built field-by-field.
    pub fn bounded(mut self) -> Self {
        let excess = self.conversation.len().saturating_sub(MAX_CONTEXT_TURNS);
        self.conversation.drain(..excess);
        let excess = self
            .previous_queries
            .len()
            .saturating_sub(MAX_PREVIOUS_QUERIES);
        self.previous_queries.drain(..excess);
        self
    }

    /// Lowercased domain + intent tags, used for context relevance.
    pub fn context_tags(&self) -> BTreeSet<String> {
        self.domain
            .iter()
            .chain(self.intent_tags.iter())
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A search query. Immutable once issued to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub sources: BTreeSet<BackendKind>,
    pub max_results: usize,
    pub threshold: f64,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub context: Option<QueryContext>,
}

impl Query {
    /// A query against every backend with default limits.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: BackendKind::ALL.into_iter().collect(),
            max_results: 10,
            threshold: 0.0,
            filters: BTreeMap::new(),
            context: None,
        }
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = BackendKind>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = Some(context.bounded());
        self
    }

    /// Caller identity, taken from the context's user id.
    pub fn caller_id(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.user_id.as_deref())
    }

    /// Reject queries the backends cannot meaningfully serve.
    pub fn validate(&self) -> Result<(), OrchestrationError> {
        if self.text.trim().is_empty() {
            return Err(OrchestrationError::invalid_query("query text is empty"));
        }
        if self.sources.is_empty() {
            return Err(OrchestrationError::invalid_query("no sources selected"));
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(OrchestrationError::invalid_query(format!(
                "max_results must be in 1..={MAX_RESULTS_LIMIT}, got {}",
                self.max_results
            )));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(OrchestrationError::invalid_query(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
