//! SQLite-backed vector similarity store.
//!
//! Rows hold content, JSON metadata, and a little-endian f32 embedding.
//! Queries are embedded with the injected [`IQueryEmbedder`] and compared
//! by cosine similarity in-process on a blocking thread.
//! `SQLITE_BUSY` / `SQLITE_LOCKED` map to Transient; other SQL errors and
//! malformed rows map to Permanent.

mod codec;
mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quarry_core::constants::META_UPDATED_AT;
use quarry_core::errors::BackendError;
use quarry_core::models::{BackendKind, Candidate, Metadata};
use quarry_core::traits::{BackendRequest, IBackendAdapter, IQueryEmbedder};
use rusqlite::{params, Connection, ErrorCode};

use crate::filters;

pub use codec::cosine;

/// A document to store, embedded on upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub id: String,
    pub source_name: String,
    pub content: String,
    pub metadata: Metadata,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VectorDocument {
    pub fn new(id: impl Into<String>, source_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_name: source_name.into(),
            content: content.into(),
            metadata: Metadata::new(),
            updated_at: None,
        }
    }

    pub fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

pub struct RelationalVectorAdapter {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn IQueryEmbedder>,
}

impl RelationalVectorAdapter {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>, embedder: Arc<dyn IQueryEmbedder>) -> Result<Self, BackendError> {
        let conn = Connection::open(path).map_err(classify_sql)?;
        schema::apply_pragmas(&conn).map_err(classify_sql)?;
        Self::with_connection(conn, embedder)
    }

    /// Private in-memory database, for tests.
    pub fn open_in_memory(embedder: Arc<dyn IQueryEmbedder>) -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory().map_err(classify_sql)?;
        Self::with_connection(conn, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn IQueryEmbedder>) -> Result<Self, BackendError> {
        schema::migrate(&conn).map_err(classify_sql)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
        conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a document, embedding its content.
    pub fn upsert(&self, doc: &VectorDocument) -> Result<(), BackendError> {
        let embedding = self.embedder.embed(&doc.content)?;
        let metadata = serde_json::to_string(&doc.metadata)
            .map_err(|e| BackendError::malformed("metadata", e))?;
        let updated_at = doc.updated_at.map(|t| t.to_rfc3339());
        Self::lock(&self.conn)
            .execute(
                schema::UPSERT_DOCUMENT,
                params![
                    doc.id,
                    doc.source_name,
                    doc.content,
                    metadata,
                    codec::encode(&embedding),
                    updated_at
                ],
            )
            .map_err(classify_sql)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, BackendError> {
        let n: i64 = Self::lock(&self.conn)
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(classify_sql)?;
        Ok(n as usize)
    }
}

struct Row {
    id: String,
    source_name: String,
    content: String,
    metadata: String,
    embedding: Vec<u8>,
    updated_at: Option<String>,
}

fn scan(
    conn: &Connection,
    query_vec: &[f32],
    request: &BackendRequest,
) -> Result<Vec<Candidate>, BackendError> {
    let mut stmt = conn.prepare_cached(schema::SELECT_DOCUMENTS).map_err(classify_sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Row {
                id: r.get(0)?,
                source_name: r.get(1)?,
                content: r.get(2)?,
                metadata: r.get(3)?,
                embedding: r.get(4)?,
                updated_at: r.get(5)?,
            })
        })
        .map_err(classify_sql)?;

    let mut hits = Vec::new();
    for row in rows {
        let row = row.map_err(classify_sql)?;
        let mut metadata: Metadata = serde_json::from_str(&row.metadata)
            .map_err(|e| BackendError::malformed("row metadata", format!("{}: {e}", row.id)))?;
        if !filters::matches(&metadata, &request.filters) {
            continue;
        }
        let embedding = codec::decode(&row.embedding)?;
        if embedding.len() != query_vec.len() {
            return Err(BackendError::malformed(
                "row embedding",
                format!(
                    "{} has {} dimensions, expected {}",
                    row.id,
                    embedding.len(),
                    query_vec.len()
                ),
            ));
        }
        let score = codec::cosine(query_vec, &embedding);
        if score <= 0.0 || score < request.threshold {
            continue;
        }
        if let Some(ts) = row.updated_at {
            metadata
                .entry(META_UPDATED_AT.to_string())
                .or_insert(serde_json::Value::String(ts));
        }
        let candidate = Candidate {
            backend: BackendKind::RelationalVector,
            document_id: row.id,
            source_name: row.source_name,
            raw_score: score,
            content: row.content,
            metadata,
        };
        candidate.validate()?;
        hits.push(candidate);
    }

    hits.sort_by(|a, b| {
        b.raw_score
            .total_cmp(&a.raw_score)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    hits.truncate(request.max_results);
    Ok(hits)
}

#[async_trait]
impl IBackendAdapter for RelationalVectorAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::RelationalVector
    }

    fn name(&self) -> &str {
        "relational-vector"
    }

    async fn search(&self, request: &BackendRequest) -> Result<Vec<Candidate>, BackendError> {
        let query_vec = self.embedder.embed(&request.text)?;
        let conn = Arc::clone(&self.conn);
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            let guard = Self::lock(&conn);
            scan(&guard, &query_vec, &request)
        })
        .await
        .map_err(|e| BackendError::transient(format!("vector scan task failed: {e}")))?
    }
}

/// Busy or locked databases are worth retrying; everything else is not.
fn classify_sql(e: rusqlite::Error) -> BackendError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            BackendError::transient(format!("sqlite busy: {e}"))
        }
        _ => BackendError::permanent(format!("sqlite: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashingEmbedder;
    use quarry_core::errors::ErrorCategory;

    fn adapter() -> RelationalVectorAdapter {
        RelationalVectorAdapter::open_in_memory(Arc::new(HashingEmbedder::new(384))).unwrap()
    }

    fn request(text: &str) -> BackendRequest {
        BackendRequest {
            text: text.into(),
            max_results: 10,
            threshold: 0.0,
            filters: Default::default(),
        }
    }

    #[tokio::test]
    async fn nearest_document_ranks_first() {
        let a = adapter();
        a.upsert(&VectorDocument::new("cal", "cal.md", "calibration steps for torque wrench"))
            .unwrap();
        a.upsert(&VectorDocument::new("cook", "cook.md", "baking bread recipe flour"))
            .unwrap();
        let hits = a.search(&request("torque wrench calibration")).await.unwrap();
        assert_eq!(hits[0].document_id, "cal");
        assert!(hits[0].raw_score > 0.5);
    }

    #[tokio::test]
    async fn upsert_replaces_and_exposes_updated_at() {
        let a = adapter();
        let at = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        a.upsert(&VectorDocument::new("d", "d.md", "old text")).unwrap();
        a.upsert(&VectorDocument::new("d", "d.md", "pressure gauge zeroing").updated(at))
            .unwrap();
        assert_eq!(a.count().unwrap(), 1);

        let hits = a.search(&request("pressure gauge")).await.unwrap();
        assert_eq!(hits[0].content, "pressure gauge zeroing");
        assert_eq!(hits[0].updated_at(), Some(at));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_permanent() {
        let a = adapter();
        a.upsert(&VectorDocument::new("d", "d.md", "gauge")).unwrap();
        let other = RelationalVectorAdapter {
            conn: Arc::clone(&a.conn),
            embedder: Arc::new(HashingEmbedder::new(64)),
        };
        let err = other.search(&request("gauge")).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Permanent);
    }
}
