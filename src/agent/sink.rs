//! Event sinks.
//!
//! The agent loop emits every event into an [`EventSink`]. A bounded
//! [`ChannelSink`] backs pull-mode streaming (the consumer's pace throttles
//! the loop and dropping the stream cancels it); [`CallbackSink`] calls a
//! handler in-line for push mode.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::events::AgentEvent;

/// The receiving side went away.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("event sink closed")]
pub struct SinkClosed;

#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: AgentEvent) -> Result<(), SinkClosed>;
}

/// Forwards events into a bounded channel.
pub struct ChannelSink {
    tx: mpsc::Sender<AgentEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AgentEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: AgentEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

/// Calls a handler synchronously for every event.
pub struct CallbackSink<F> {
    handler: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&AgentEvent) + Send,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> EventSink for CallbackSink<F>
where
    F: FnMut(&AgentEvent) + Send,
{
    async fn emit(&mut self, event: AgentEvent) -> Result<(), SinkClosed> {
        (self.handler)(&event);
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<AgentEvent>,
}

#[async_trait]
impl EventSink for CollectSink {
    async fn emit(&mut self, event: AgentEvent) -> Result<(), SinkClosed> {
        self.events.push(event);
        Ok(())
    }
}

/// Discards events.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&mut self, _event: AgentEvent) -> Result<(), SinkClosed> {
        Ok(())
    }
}
