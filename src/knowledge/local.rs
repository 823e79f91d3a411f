//! Local knowledge base backed by SQLite FTS5.
//!
//! Passages are imported from text files, one per blank-line separated
//! paragraph, and ranked with BM25 at query time.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use super::{KnowledgeBase, KnowledgeError, Passage};

pub struct LocalKnowledgeBase {
    db: Arc<Mutex<Connection>>,
    kb_id: String,
}

impl LocalKnowledgeBase {
    pub fn new(db: Arc<Mutex<Connection>>, kb_id: &str) -> Self {
        Self {
            db,
            kb_id: kb_id.to_string(),
        }
    }
}

#[async_trait]
impl KnowledgeBase for LocalKnowledgeBase {
    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, KnowledgeError> {
        let db = Arc::clone(&self.db);
        let kb_id = self.kb_id.clone();
        let query = query.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| KnowledgeError::Task(format!("db lock poisoned: {e}")))?;
            search_passages(&conn, &kb_id, &query, max_results)
        })
        .await
        .map_err(|e| KnowledgeError::Task(e.to_string()))?
    }

    fn id(&self) -> &str {
        &self.kb_id
    }
}

/// Split `text` into paragraphs and insert each as a passage. Returns the
/// number of passages written.
pub fn import_text(
    conn: &mut Connection,
    kb_id: &str,
    source: Option<&str>,
    text: &str,
) -> Result<usize, KnowledgeError> {
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();
    let mut count = 0;

    for paragraph in split_paragraphs(text) {
        tx.execute(
            "INSERT INTO kb_passages (kb_id, source, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![kb_id, source, paragraph, now],
        )?;
        let rowid = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO kb_passages_fts (rowid, content, kb_id) VALUES (?1, ?2, ?3)",
            params![rowid, paragraph, kb_id],
        )?;
        count += 1;
    }

    tx.commit()?;
    Ok(count)
}

/// BM25 keyword search over one knowledge base.
///
/// FTS5 rank is negative (more negative = better), so it is negated into the
/// returned score.
pub fn search_passages(
    conn: &Connection,
    kb_id: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<Passage>, KnowledgeError> {
    let escaped = escape_fts_query(query);
    if escaped.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT p.content, p.source, kb_passages_fts.rank FROM kb_passages_fts \
         JOIN kb_passages p ON p.id = kb_passages_fts.rowid \
         WHERE kb_passages_fts MATCH ?1 AND p.kb_id = ?2 \
         ORDER BY kb_passages_fts.rank LIMIT ?3",
    )?;
    let passages = stmt
        .query_map(params![escaped, kb_id, limit as i64], |row| {
            Ok(Passage {
                text: row.get(0)?,
                source: row.get(1)?,
                score: -row.get::<_, f64>(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(passages)
}

/// Quote each word and join with OR so any matching term ranks a passage.
fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| {
            let clean: String = word.chars().filter(|c| *c != '"').collect();
            format!("\"{clean}\"")
        })
        .filter(|w| w != "\"\"")
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}
