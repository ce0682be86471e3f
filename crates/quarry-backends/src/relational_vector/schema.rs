//! Table layout and connection pragmas for the vector store.

use rusqlite::Connection;

pub const CREATE_DOCUMENTS: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY,
    source_name TEXT NOT NULL,
    content     TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    embedding   BLOB NOT NULL,
    updated_at  TEXT
);
";

pub const UPSERT_DOCUMENT: &str = "
INSERT INTO documents (id, source_name, content, metadata, embedding, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    source_name = excluded.source_name,
    content     = excluded.content,
    metadata    = excluded.metadata,
    embedding   = excluded.embedding,
    updated_at  = excluded.updated_at
";

pub const SELECT_DOCUMENTS: &str =
    "SELECT id, source_name, content, metadata, embedding, updated_at FROM documents";

/// WAL, NORMAL sync, 5s busy timeout.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_DOCUMENTS)
}
