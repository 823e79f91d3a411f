//! Model invocation.
//!
//! The [`ModelProvider`] trait streams [`ModelChunk`]s for a request. Two
//! implementations: [`openai::OpenAiCompatProvider`] for any OpenAI-compatible
//! chat completions endpoint and [`scripted::ScriptedProvider`], which replays
//! canned turns.

pub mod openai;
pub mod scripted;
pub mod types;

pub use types::*;

use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Decode(String),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    #[error("scripted provider: {0}")]
    Script(String),
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ModelChunk, ModelError>> + Send>>;

pub trait ModelProvider: Send + Sync {
    /// Start a streamed completion. Errors surface as stream items.
    fn stream(&self, request: ModelRequest) -> ChunkStream;

    fn model_id(&self) -> &str;
}
