//! Shared test doubles and fixture data for Quarry integration tests.
//!
//! - [`ScriptedAdapter`]: a backend adapter that replays a scripted sequence
//!   of outcomes, counts calls, and can simulate latency or hang.
//! - [`StaticFeedback`]: fixed per-document feedback ratios.
//! - [`candidate`] / [`dated_candidate`]: terse candidate builders.
//! - JSON fixture loading from this crate's `data/` directory.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::errors::BackendError;
use quarry_core::models::{BackendKind, Candidate};
use quarry_core::traits::{BackendRequest, IBackendAdapter, IFeedbackSource};
use serde::de::DeserializeOwned;

/// One scripted adapter outcome.
#[derive(Debug, Clone)]
pub enum Step {
    Ok(Vec<Candidate>),
    Err(BackendError),
    /// Never returns; use to exercise deadlines.
    Hang,
}

/// Adapter replaying [`Step`]s in order, then repeating `fallback_step` forever.
pub struct ScriptedAdapter {
    kind: BackendKind,
    name: String,
    steps: Mutex<VecDeque<Step>>,
    fallback_step: Step,
    latency: Option<Duration>,
    calls: AtomicU32,
    last_request: Mutex<Option<BackendRequest>>,
}

impl ScriptedAdapter {
    /// Adapter that always returns `results`.
    pub fn ok(kind: BackendKind, results: Vec<Candidate>) -> Self {
        Self::always(kind, Step::Ok(results))
    }

    /// Adapter that always fails with `error`.
    pub fn failing(kind: BackendKind, error: BackendError) -> Self {
        Self::always(kind, Step::Err(error))
    }

    /// Adapter whose every call hangs.
    pub fn hanging(kind: BackendKind) -> Self {
        Self::always(kind, Step::Hang)
    }

    pub fn always(kind: BackendKind, step: Step) -> Self {
        Self {
            kind,
            name: format!("scripted-{kind}"),
            steps: Mutex::new(VecDeque::new()),
            fallback_step: step,
            latency: None,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Play `steps` first, then `then` forever.
    pub fn scripted(kind: BackendKind, steps: impl IntoIterator<Item = Step>, then: Step) -> Self {
        let adapter = Self::always(kind, then);
        adapter
            .steps
            .lock()
            .expect("fresh mutex")
            .extend(steps);
        adapter
    }

    /// Sleep this long (tokio time) before every outcome.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.last_request.lock().expect("lock").clone()
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback_step.clone())
    }
}

#[async_trait]
impl IBackendAdapter for ScriptedAdapter {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &BackendRequest) -> Result<Vec<Candidate>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("lock") = Some(request.clone());
        let step = self.next_step();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match step {
            Step::Ok(results) => Ok(results),
            Step::Err(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Feedback source with fixed ratios keyed by document id.
#[derive(Debug, Default, Clone)]
pub struct StaticFeedback {
    ratios: HashMap<String, f64>,
}

impl StaticFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, document_id: impl Into<String>, ratio: f64) -> Self {
        self.ratios.insert(document_id.into(), ratio);
        self
    }
}

impl IFeedbackSource for StaticFeedback {
    fn feedback_ratio(&self, document_id: &str) -> Option<f64> {
        self.ratios.get(document_id).copied()
    }
}

/// Candidate with source name `{id}.md`.
pub fn candidate(backend: BackendKind, id: &str, raw_score: f64, content: &str) -> Candidate {
    Candidate::new(backend, id, format!("{id}.md"), raw_score, content)
}

/// Candidate stamped with an `updated_at` RFC 3339 timestamp.
pub fn dated_candidate(
    backend: BackendKind,
    id: &str,
    raw_score: f64,
    content: &str,
    updated_at: &str,
) -> Candidate {
    candidate(backend, id, raw_score, content).with_metadata(
        quarry_core::constants::META_UPDATED_AT,
        serde_json::Value::String(updated_at.to_string()),
    )
}

/// Absolute path to a file under this crate's `data/` directory.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(relative_path)
}

/// Load and deserialize a JSON fixture.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}
