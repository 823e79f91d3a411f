#![allow(dead_code)]

use restobot::agent::Agent;
use restobot::booking::{store, BookingTable};
use restobot::db;
use restobot::knowledge::local::{import_text, LocalKnowledgeBase};
use restobot::model::scripted::{ScriptedProvider, ScriptedTurn};
use restobot::server::AppState;
use restobot::config::RestobotConfig;
use restobot::tools::{BookingTools, ToolOutcome};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub const KB_ID: &str = "restaurants";

/// A small restaurant directory, one restaurant per paragraph.
pub const RESTAURANT_DIRECTORY: &str = "\
Rice & Spice serves Thai and Indian dishes. Open daily from 12:00 to 23:00.

Nonna's Kitchen serves fresh Italian pasta and wood-fired pizza.

The Harbor Grill serves seafood and steaks with a view of the marina.";

/// Open a fresh in-memory database with schema, migrations and the default
/// booking table.
pub fn test_db() -> Connection {
    let conn = db::open_memory_database().unwrap();
    store::ensure_table(&conn, &BookingTable::default()).unwrap();
    conn
}

/// Booking tools over an in-memory database seeded with the directory.
pub fn test_tools() -> BookingTools {
    let mut conn = test_db();
    import_text(&mut conn, KB_ID, Some("directory.md"), RESTAURANT_DIRECTORY).unwrap();

    let db = Arc::new(Mutex::new(conn));
    let kb = Arc::new(LocalKnowledgeBase::new(Arc::clone(&db), KB_ID));
    BookingTools::new(db, BookingTable::default(), kb, 5)
}

/// An agent driven by `turns` over `tools`.
pub fn scripted_agent(
    tools: &BookingTools,
    turns: Vec<ScriptedTurn>,
) -> (Agent, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new(turns));
    let agent = Agent::builder(provider.clone(), tools.registry())
        .system_prompt("You are Restaurant Helper.")
        .max_turns(4)
        .build();
    (agent, provider)
}

/// HTTP app state around a scripted provider.
pub fn scripted_state(turns: Vec<ScriptedTurn>) -> AppState {
    let provider = Arc::new(ScriptedProvider::new(turns));
    AppState::new(&RestobotConfig::default(), test_tools(), provider)
}

/// The `booking_id` field of a successful create outcome.
pub fn created_id(outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Success { content } => content["booking_id"]
            .as_str()
            .expect("booking_id in create outcome")
            .to_string(),
        other => panic!("expected success, got {other:?}"),
    }
}
