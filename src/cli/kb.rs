//! CLI `kb` commands: import passages into the local knowledge base and
//! query it.

use anyhow::{Context, Result};
use std::path::Path;

use restobot::config::RestobotConfig;
use restobot::db;
use restobot::knowledge::local::{import_text, search_passages};

const IMPORT_EXTENSIONS: &[&str] = &["md", "txt"];

/// Import a `.md`/`.txt` file, or every such file in a directory.
pub fn import(config: &RestobotConfig, path: &Path) -> Result<()> {
    let mut conn = db::open_database(config.resolved_db_path())?;
    let kb_id = &config.knowledge_base.id;

    let files = if path.is_dir() {
        let mut files: Vec<_> = std::fs::read_dir(path)
            .with_context(|| format!("failed to read directory {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMPORT_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut total = 0;
    for file in &files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let source = file.file_name().and_then(|n| n.to_str());
        let count = import_text(&mut conn, kb_id, source, &text)
            .with_context(|| format!("failed to import {}", file.display()))?;
        println!("  {:<40} {count} passages", file.display());
        total += count;
    }

    println!("Imported {total} passages from {} files into '{kb_id}'.", files.len());
    Ok(())
}

pub fn search(config: &RestobotConfig, query: &str, limit: usize) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;
    let passages = search_passages(&conn, &config.knowledge_base.id, query, limit)?;

    if passages.is_empty() {
        println!("No passages match '{query}'.");
        return Ok(());
    }
    for (i, p) in passages.iter().enumerate() {
        println!(
            "{}. [{:.2}] {}",
            i + 1,
            p.score,
            p.source.as_deref().unwrap_or("-")
        );
        println!("   {}", p.text.replace('\n', "\n   "));
    }
    Ok(())
}
