//! Restaurant booking assistant: an LLM agent loop with booking tools,
//! streamed over HTTP and exposed over MCP.
//!
//! restobot lets a conversational agent answer questions about a restaurant
//! directory and create, look up and cancel table bookings. Bookings live in
//! a key-value table keyed by `(booking_id, restaurant_name)`:
//!
//! | Tool | Input | Outcome |
//! |------|-------|---------|
//! | `retrieve` | query, max results | passages from the knowledge base |
//! | `get_booking_details` | booking id, restaurant | the booking, or `not_found` |
//! | `create_booking` | date, hour, restaurant, guest, party size | the new 8-character id |
//! | `delete_booking` | booking id, restaurant | success, or `not_found` |
//!
//! # Architecture
//!
//! - **Storage**: SQLite (WAL) for the booking table, its audit log, and an
//!   FTS5-indexed passage table backing the local knowledge base
//! - **Model**: any OpenAI-compatible chat completions endpoint, streamed over SSE
//! - **Agent**: a tool-use loop that reports every step as an [`agent::AgentEvent`],
//!   consumed as a pull stream or through a push callback
//! - **Transport**: `POST /invocations` streams answer text; the tools are also
//!   served over MCP (stdio or streamable HTTP)
//!
//! # Modules
//!
//! - [`agent`]: Agent loop, events, sinks and stream adapters
//! - [`booking`]: Booking records and the table store
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`knowledge`]: Knowledge base retrieval (local FTS5 or HTTP)
//! - [`model`]: Streaming model providers
//! - [`server`]: HTTP and MCP servers
//! - [`tools`]: The booking tools, their registry and the MCP handler

pub mod agent;
pub mod booking;
pub mod config;
pub mod db;
pub mod knowledge;
pub mod model;
pub mod server;
pub mod tools;
