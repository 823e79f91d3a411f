//! CLI `doctor` command: database diagnostics and a config summary.

use anyhow::{Context, Result};

use restobot::booking::{store, BookingTable};
use restobot::config::RestobotConfig;
use restobot::db;

pub fn doctor(config: &RestobotConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `restobot serve` or `restobot kb import <dir>` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let table = BookingTable::new(config.storage.table_name.clone())
        .context("invalid storage.table_name")?;
    store::ensure_table(&conn, &table)?;

    let report = db::check_database_health(&conn, &table).context("failed to run health check")?;

    println!("restobot Health Report");
    println!("======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Booking table:     {table}");
    println!();
    println!("Model:");
    println!("  Endpoint:        {}", config.model.endpoint);
    println!("  Model id:        {}", config.model.model_id);
    if config.model.api_key_env.is_empty() {
        println!("  API key:         (none required)");
    } else if std::env::var(&config.model.api_key_env).is_ok() {
        println!("  API key:         ${} set", config.model.api_key_env);
    } else {
        println!("  API key:         WARNING ${} is not set", config.model.api_key_env);
    }
    println!();
    println!(
        "Knowledge base:    {} ({})",
        config.knowledge_base.id, config.knowledge_base.provider
    );
    println!();
    println!("Row counts:");
    println!("  Bookings:        {}", report.booking_count);
    println!("  KB passages:     {}", report.passage_count);
    println!("  Audit log:       {}", report.log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery: restore {} from a backup.", db_path.display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
