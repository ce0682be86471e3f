//! Cache key for a search: blake3 over the fields that can change its result.
//!
//! Included: text, sources, max_results, threshold, filters, context domain
//! and intent tags, caller identity, and the ranking options. Conversation
//! turns, previous queries, and anything time-dependent are excluded.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use quarry_core::models::{BackendKind, Query};
use serde::Serialize;

use crate::options::SearchOptions;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

#[derive(Serialize)]
struct Key<'a> {
    text: &'a str,
    sources: &'a BTreeSet<BackendKind>,
    max_results: usize,
    threshold: u64,
    filters: &'a BTreeMap<String, String>,
    context_tags: BTreeSet<String>,
    caller: Option<&'a str>,
    options: &'a SearchOptions,
}

impl Fingerprint {
    pub fn of(query: &Query, options: &SearchOptions) -> Self {
        let key = Key {
            text: query.text.trim(),
            sources: &query.sources,
            max_results: query.max_results,
            threshold: query.threshold.to_bits(),
            filters: &query.filters,
            context_tags: query
                .context
                .as_ref()
                .map(|c| c.context_tags())
                .unwrap_or_default(),
            caller: query.caller_id(),
            options,
        };
        // Serializing plain maps, sets, and numbers cannot fail.
        let bytes = serde_json::to_vec(&key).unwrap_or_default();
        Self(blake3::hash(&bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
