//! The agent loop.
//!
//! An [`Agent`] owns a conversation history, a model provider and a tool
//! registry. Each invocation appends the user's prompt, then alternates model
//! turns and tool executions until the model ends its turn or the turn limit
//! is hit. Every step is reported as an [`AgentEvent`] through an
//! [`EventSink`]; the pull ([`Agent::stream`]) and push ([`Agent::invoke_with`])
//! modes differ only in the sink they pass in.

pub mod events;
pub mod prompt;
pub mod sink;
pub mod stream;

pub use events::{AgentEvent, EventKind};
pub use prompt::extract_answer;
pub use sink::{CallbackSink, ChannelSink, CollectSink, EventSink, NullSink, SinkClosed};
pub use stream::{forward_text, text_chunks};

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::config::RestobotConfig;
use crate::model::{
    ContentBlock, Message, ModelChunk, ModelError, ModelProvider, ModelRequest, Role, StopReason,
};
use crate::tools::ToolRegistry;

/// Events buffered between the loop and a pull-mode consumer.
const STREAM_BUFFER: usize = 32;

pub type EventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("turn limit of {0} reached without a final answer")]
    MaxTurns(usize),

    #[error("event consumer went away")]
    Cancelled,
}

impl From<SinkClosed> for AgentError {
    fn from(_: SinkClosed) -> Self {
        AgentError::Cancelled
    }
}

/// Final answer of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    pub text: String,
    pub stop_reason: StopReason,
    pub turns: usize,
}

impl AgentResult {
    /// The answer with its `<tag>` delimiter stripped.
    pub fn answer(&self, tag: &str) -> &str {
        extract_answer(&self.text, tag)
    }
}

#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    model_id: String,
    max_turns: usize,
    temperature: Option<f32>,
    answer_tag: String,
    history: Arc<Mutex<Vec<Message>>>,
}

pub struct AgentBuilder {
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    system_prompt: String,
    model_id: Option<String>,
    max_turns: usize,
    temperature: Option<f32>,
    answer_tag: String,
    history: Vec<Message>,
}

impl AgentBuilder {
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn answer_tag(mut self, tag: impl Into<String>) -> Self {
        self.answer_tag = tag.into();
        self
    }

    /// Seed the conversation.
    pub fn history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn build(self) -> Agent {
        let model_id = self
            .model_id
            .unwrap_or_else(|| self.provider.model_id().to_string());
        Agent {
            provider: self.provider,
            tools: Arc::new(self.tools),
            system_prompt: self.system_prompt,
            model_id,
            max_turns: self.max_turns,
            temperature: self.temperature,
            answer_tag: self.answer_tag,
            history: Arc::new(Mutex::new(self.history)),
        }
    }
}

impl Agent {
    pub fn builder(provider: Arc<dyn ModelProvider>, tools: ToolRegistry) -> AgentBuilder {
        AgentBuilder {
            provider,
            tools,
            system_prompt: String::new(),
            model_id: None,
            max_turns: 8,
            temperature: None,
            answer_tag: "answer".to_string(),
            history: Vec::new(),
        }
    }

    /// Builder preloaded with the model and agent sections of the config.
    pub fn from_config(
        config: &RestobotConfig,
        provider: Arc<dyn ModelProvider>,
        tools: ToolRegistry,
    ) -> AgentBuilder {
        Self::builder(provider, tools)
            .system_prompt(prompt::system_prompt(&config.agent))
            .model_id(config.model.model_id.clone())
            .max_turns(config.model.max_turns)
            .temperature(config.model.temperature)
            .answer_tag(config.agent.answer_tag.clone())
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn answer_tag(&self) -> &str {
        &self.answer_tag
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Same configuration, empty history.
    pub fn fresh(&self) -> Agent {
        Agent {
            history: Arc::new(Mutex::new(Vec::new())),
            ..self.clone()
        }
    }

    /// Snapshot of the conversation so far.
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }

    /// Run one invocation without observing events.
    pub async fn invoke(&self, prompt: &str) -> Result<AgentResult, AgentError> {
        self.run(prompt, &mut NullSink).await
    }

    /// Push mode: `handler` is called in-line for every event.
    pub async fn invoke_with<F>(&self, prompt: &str, handler: F) -> Result<AgentResult, AgentError>
    where
        F: FnMut(&AgentEvent) + Send,
    {
        let mut sink = CallbackSink::new(handler);
        self.run(prompt, &mut sink).await
    }

    /// Pull mode: events arrive through a bounded channel fed by a spawned
    /// task. Dropping the stream cancels the invocation at its next event.
    pub fn stream(&self, prompt: impl Into<String>) -> EventStream {
        let (tx, mut rx) = mpsc::channel(STREAM_BUFFER);
        let agent = self.clone();
        let prompt = prompt.into();

        tokio::spawn(async move {
            let mut sink = ChannelSink::new(tx);
            match agent.run(&prompt, &mut sink).await {
                Ok(result) => tracing::debug!(turns = result.turns, "streamed invocation finished"),
                Err(AgentError::Cancelled) => {
                    tracing::info!("stream consumer dropped, invocation cancelled")
                }
                Err(e) => tracing::warn!(error = %e, "streamed invocation failed"),
            }
        });

        Box::pin(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        })
    }

    /// Drive one invocation, reporting into `sink`.
    ///
    /// The history lock is held for the whole invocation, so concurrent
    /// invocations on clones of one agent run one after another. On failure
    /// the history is rolled back to where it was before the prompt.
    pub async fn run(
        &self,
        prompt: &str,
        sink: &mut dyn EventSink,
    ) -> Result<AgentResult, AgentError> {
        let mut history = self.history.lock().await;
        let start_len = history.len();

        let result = self.run_turns(&mut history, prompt, sink).await;
        match &result {
            Ok(done) => {
                tracing::info!(
                    turns = done.turns,
                    stop_reason = ?done.stop_reason,
                    "invocation complete"
                )
            }
            Err(e) => {
                history.truncate(start_len);
                if !matches!(e, AgentError::Cancelled) {
                    // Best effort: the consumer may already be gone.
                    let _ = sink.emit(AgentEvent::ForceStop { reason: e.to_string() }).await;
                }
            }
        }
        result
    }

    async fn run_turns(
        &self,
        history: &mut Vec<Message>,
        prompt: &str,
        sink: &mut dyn EventSink,
    ) -> Result<AgentResult, AgentError> {
        history.push(Message::user(prompt));
        sink.emit(AgentEvent::Start { max_turns: self.max_turns }).await?;

        let specs = self.tools.specs();

        for turn in 1..=self.max_turns {
            sink.emit(AgentEvent::TurnStart { turn }).await?;

            let request = ModelRequest {
                model_id: self.model_id.clone(),
                system: self.system_prompt.clone(),
                messages: history.clone(),
                tools: specs.clone(),
                temperature: self.temperature,
            };

            let mut chunks = self.provider.stream(request);
            let mut text = String::new();
            let mut tool_uses: Vec<(String, String, serde_json::Value)> = Vec::new();
            let mut stop: Option<StopReason> = None;

            while let Some(chunk) = chunks.next().await {
                match chunk? {
                    ModelChunk::TextDelta(data) => {
                        text.push_str(&data);
                        sink.emit(AgentEvent::TextDelta { data }).await?;
                    }
                    ModelChunk::ToolUse { id, name, input } => {
                        tracing::debug!(tool = %name, id = %id, "model selected tool");
                        sink.emit(AgentEvent::ToolSelected {
                            id: id.clone(),
                            name: name.clone(),
                            input: input.clone(),
                        })
                        .await?;
                        tool_uses.push((id, name, input));
                    }
                    ModelChunk::Stop(reason) => stop = Some(reason),
                }
            }

            // Providers occasionally omit the stop chunk; tool calls imply tool_use.
            let stop_reason = match (stop, tool_uses.is_empty()) {
                (_, false) => StopReason::ToolUse,
                (Some(reason), true) => reason,
                (None, true) => StopReason::EndTurn,
            };
            sink.emit(AgentEvent::TurnComplete { turn, stop_reason }).await?;

            let mut content = Vec::with_capacity(tool_uses.len() + 1);
            if !text.is_empty() {
                content.push(ContentBlock::Text { text: text.clone() });
            }
            for (id, name, input) in &tool_uses {
                content.push(ContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                });
            }
            history.push(Message {
                role: Role::Assistant,
                content,
            });

            if tool_uses.is_empty() {
                sink.emit(AgentEvent::Result {
                    text: text.clone(),
                    stop_reason,
                    turns: turn,
                })
                .await?;
                return Ok(AgentResult {
                    text,
                    stop_reason,
                    turns: turn,
                });
            }

            let outcomes = futures::future::join_all(
                tool_uses
                    .iter()
                    .map(|(_, name, input)| self.tools.dispatch(name, input.clone())),
            )
            .await;

            let mut results = Vec::with_capacity(outcomes.len());
            for ((id, name, _), outcome) in tool_uses.into_iter().zip(outcomes) {
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: outcome.to_text(),
                    is_error: !outcome.is_success(),
                });
                sink.emit(AgentEvent::ToolResult { id, name, outcome }).await?;
            }
            history.push(Message {
                role: Role::User,
                content: results,
            });
        }

        Err(AgentError::MaxTurns(self.max_turns))
    }
}
