//! Response cache with single-flight coalescing.
//!
//! Completed non-empty responses live in a moka cache with a TTL. While a
//! fingerprint is being computed, later identical requests wait on the same
//! `OnceCell` instead of fanning out again. If the computing request is
//! cancelled, a waiter takes over the computation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::sync::Cache;
use quarry_core::config::CacheConfig;
use quarry_core::errors::OrchestrationError;
use quarry_core::models::SearchResponse;
use tokio::sync::OnceCell;

use crate::fingerprint::Fingerprint;

type Outcome = Result<SearchResponse, OrchestrationError>;

/// How a response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a stored entry.
    Hit,
    /// This request computed the response.
    Computed,
    /// Shared the result of an identical in-flight request.
    Coalesced,
}

pub struct ResultCache {
    entries: Option<Cache<Fingerprint, SearchResponse>>,
    inflight: DashMap<Fingerprint, Arc<OnceCell<Outcome>>>,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = config.enabled.then(|| Self::build(config.ttl(), config.max_entries));
        Self {
            entries,
            inflight: DashMap::new(),
        }
    }

    /// Cache with an explicit TTL, for tests.
    pub fn with_ttl(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Some(Self::build(ttl, max_entries)),
            inflight: DashMap::new(),
        }
    }

    fn build(ttl: Duration, max_entries: u64) -> Cache<Fingerprint, SearchResponse> {
        Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build()
    }

    pub fn get(&self, key: &Fingerprint) -> Option<SearchResponse> {
        self.entries.as_ref().and_then(|c| c.get(key))
    }

    /// Store a successful response. Empty result lists are not cached.
    pub fn insert(&self, key: Fingerprint, response: SearchResponse) {
        if response.results.is_empty() {
            return;
        }
        if let Some(c) = &self.entries {
            c.insert(key, response);
        }
    }

    /// Serve `key` from the cache, an in-flight computation, or `compute`.
    pub async fn get_or_compute<F, Fut>(&self, key: Fingerprint, compute: F) -> (Outcome, CacheOutcome)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        if let Some(hit) = self.get(&key) {
            return (Ok(hit), CacheOutcome::Hit);
        }

        let cell = Arc::clone(
            self.inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let ran = AtomicBool::new(false);
        let outcome = cell
            .get_or_init(|| {
                ran.store(true, Ordering::SeqCst);
                compute()
            })
            .await
            .clone();

        if ran.load(Ordering::SeqCst) {
            // Publish before retiring the in-flight slot so late arrivals hit the cache.
            if let Ok(response) = &outcome {
                self.insert(key.clone(), response.clone());
            }
            self.inflight
                .remove_if(&key, |_, existing| Arc::ptr_eq(existing, &cell));
            (outcome, CacheOutcome::Computed)
        } else {
            (outcome, CacheOutcome::Coalesced)
        }
    }

    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    pub fn invalidate_all(&self) {
        if let Some(c) = &self.entries {
            c.invalidate_all();
        }
    }
}
