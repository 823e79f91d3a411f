//! Tagged tool results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::booking::BookingError;

/// What went wrong in a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The requested record does not exist. A legitimate answer, not a fault.
    NotFound,
    /// Arguments were missing, malformed, or named an unknown tool.
    InvalidInput,
    /// The booking store failed.
    Storage,
    /// The knowledge base failed.
    Retrieval,
}

/// Result of one tool call: a success payload or a typed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { content: Value },
    Error { kind: ToolErrorKind, message: String },
}

impl ToolOutcome {
    pub fn success(content: Value) -> Self {
        Self::Success { content }
    }

    pub fn error(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Error { kind, .. } => Some(*kind),
        }
    }

    /// Text handed back to the model: the payload (strings unquoted) or the
    /// error message.
    pub fn to_text(&self) -> String {
        match self {
            Self::Success { content: Value::String(s) } => s.clone(),
            Self::Success { content } => content.to_string(),
            Self::Error { message, .. } => message.clone(),
        }
    }
}

impl From<BookingError> for ToolOutcome {
    fn from(err: BookingError) -> Self {
        let kind = match &err {
            BookingError::NotFound(_) => ToolErrorKind::NotFound,
            BookingError::Invalid(_)
            | BookingError::InvalidTable(_)
            | BookingError::InvalidToken(_) => ToolErrorKind::InvalidInput,
            BookingError::IdExhausted(_) | BookingError::Storage(_) => ToolErrorKind::Storage,
        };
        Self::error(kind, err.to_string())
    }
}
