pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::booking::types::BookingTable;

/// Open (or create) the restobot database at the given path with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL so the HTTP server and CLI can read while a tool writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug)]
pub struct HealthReport {
    pub schema_version: u32,
    pub booking_count: i64,
    pub passage_count: i64,
    pub log_count: i64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Row counts plus `PRAGMA integrity_check`.
pub fn check_database_health(conn: &Connection, table: &BookingTable) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;

    let count = |sql: &str| -> Result<i64> {
        conn.query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("count query failed: {sql}"))
    };

    let booking_count = count(&format!("SELECT COUNT(*) FROM {}", table.quoted()))?;
    let passage_count = count("SELECT COUNT(*) FROM kb_passages")?;
    let log_count = count("SELECT COUNT(*) FROM booking_log")?;

    let integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

    Ok(HealthReport {
        schema_version,
        booking_count,
        passage_count,
        log_count,
        integrity_ok: integrity_details == "ok",
        integrity_details,
    })
}
