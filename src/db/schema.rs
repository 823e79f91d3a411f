//! SQL DDL for the restobot database.
//!
//! Defines `kb_passages`, `kb_passages_fts` (FTS5) and `schema_meta`. The
//! booking table itself has a configurable name and is created by
//! [`crate::booking::store::ensure_table`]. All DDL uses `IF NOT EXISTS` for
//! idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Local knowledge base passages
CREATE TABLE IF NOT EXISTS kb_passages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kb_id TEXT NOT NULL,
    source TEXT,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_kb_passages_kb ON kb_passages(kb_id);

-- Full-text search (BM25)
CREATE VIRTUAL TABLE IF NOT EXISTS kb_passages_fts USING fts5(
    content,
    kb_id UNINDEXED,
    content='kb_passages',
    content_rowid='id'
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
