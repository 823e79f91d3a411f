//! Knowledge base retrieval.
//!
//! Provides the [`KnowledgeBase`] trait and two implementations: [`local`]
//! (FTS5 over passages imported into the restobot database) and [`http`]
//! (a managed retrieval service). The implementation is chosen from
//! configuration via [`create_knowledge_base`].

pub mod http;
pub mod local;

use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::KnowledgeBaseConfig;

/// A retrieved text passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Higher is more relevant. Scales differ between providers.
    pub score: f64,
    pub source: Option<String>,
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("retrieval request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("retrieval service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("knowledge base query failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("knowledge base task failed: {0}")]
    Task(String),
}

/// A retrieval service keyed by a knowledge base identifier.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Return up to `max_results` passages relevant to `query`, best first.
    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, KnowledgeError>;

    /// The knowledge base identifier queries are scoped to.
    fn id(&self) -> &str;
}

/// Create a knowledge base from config.
///
/// `"local"` shares the booking database connection; `"http"` talks to
/// `config.endpoint`.
pub fn create_knowledge_base(
    config: &KnowledgeBaseConfig,
    db: Arc<Mutex<Connection>>,
) -> anyhow::Result<Arc<dyn KnowledgeBase>> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(local::LocalKnowledgeBase::new(db, &config.id))),
        "http" => Ok(Arc::new(http::HttpKnowledgeBase::new(
            &config.endpoint,
            &config.id,
        )?)),
        other => anyhow::bail!("unknown knowledge base provider: {other}. Supported: local, http"),
    }
}
