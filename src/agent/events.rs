//! Agent events emitted during an invocation.
//!
//! A typical sequence:
//! 1. `Start`
//! 2. per turn: `TurnStart`, `TextDelta` / `ToolSelected`, `TurnComplete`,
//!    then `ToolResult` for each selected tool
//! 3. `Result`, or `ForceStop` if the loop was cut short

use serde::{Deserialize, Serialize};

use crate::model::StopReason;
use crate::tools::ToolOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Invocation accepted.
    Start { max_turns: usize },

    /// A model round-trip is starting.
    TurnStart { turn: usize },

    /// A streamed piece of model text.
    TextDelta { data: String },

    /// The model selected a tool.
    ToolSelected {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// A selected tool finished.
    ToolResult {
        id: String,
        name: String,
        outcome: ToolOutcome,
    },

    /// A model round-trip finished.
    TurnComplete { turn: usize, stop_reason: StopReason },

    /// Final answer for the invocation.
    Result {
        text: String,
        stop_reason: StopReason,
        turns: usize,
    },

    /// The loop stopped before a final answer.
    ForceStop { reason: String },
}

/// Coarse category of an [`AgentEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Lifecycle,
    Text,
    ToolSelection,
    ToolResult,
    Result,
    ForceStop,
}

impl AgentEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } | Self::TurnStart { .. } | Self::TurnComplete { .. } => {
                EventKind::Lifecycle
            }
            Self::TextDelta { .. } => EventKind::Text,
            Self::ToolSelected { .. } => EventKind::ToolSelection,
            Self::ToolResult { .. } => EventKind::ToolResult,
            Self::Result { .. } => EventKind::Result,
            Self::ForceStop { .. } => EventKind::ForceStop,
        }
    }

    /// The text carried by a text-bearing event.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::TextDelta { data } => Some(data),
            _ => None,
        }
    }

    /// `true` for the last event of an invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::ForceStop { .. })
    }
}
