//! OpenAI-compatible chat completions provider.
//!
//! Sends the conversation with `stream: true` and decodes the server-sent
//! event stream with [`SseDecoder`]. Tool-call arguments arrive as JSON
//! fragments keyed by index; they are accumulated and emitted as complete
//! [`ModelChunk::ToolUse`] chunks when the choice finishes.

use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{
    ChunkStream, ContentBlock, ModelChunk, ModelError, ModelProvider, ModelRequest, Role,
    StopReason,
};
use crate::config::ModelConfig;

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
}

impl OpenAiCompatProvider {
    pub fn new(
        endpoint: &str,
        model_id: &str,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ModelError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            api_key,
        })
    }

    /// Build from config. An empty `api_key_env` means the endpoint needs no key.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = if config.api_key_env.is_empty() {
            None
        } else {
            let key = std::env::var(&config.api_key_env)
                .map_err(|_| ModelError::MissingApiKey(config.api_key_env.clone()))?;
            Some(key)
        };
        Self::new(
            &config.endpoint,
            &config.model_id,
            api_key,
            config.timeout_secs.map(Duration::from_secs),
        )
    }
}

impl ModelProvider for OpenAiCompatProvider {
    fn stream(&self, request: ModelRequest) -> ChunkStream {
        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.endpoint);
        let api_key = self.api_key.clone();
        let body = build_body(&request);

        tracing::debug!(
            model = %request.model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "chat completions streaming request"
        );

        Box::pin(async_stream::stream! {
            let mut req = client.post(&url).json(&body);
            if let Some(key) = &api_key {
                req = req.bearer_auth(key);
            }
            let response = match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(ModelError::Http(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, "chat completions error");
                yield Err(ModelError::Status { status: status.as_u16(), body });
                return;
            }

            let mut decoder = SseDecoder::default();
            let mut bytes = response.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                let decoded = match chunk {
                    Ok(chunk) => decoder.feed(&chunk),
                    Err(e) => Err(ModelError::Http(e)),
                };
                match decoded {
                    Ok(items) => {
                        for item in items {
                            yield Ok(item);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            for item in decoder.finish() {
                yield Ok(item);
            }
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Translate a [`ModelRequest`] into a chat completions request body.
pub fn build_body(request: &ModelRequest) -> Value {
    let mut messages = Vec::new();
    if !request.system.is_empty() {
        messages.push(json!({ "role": "system", "content": request.system }));
    }

    for message in &request.messages {
        match message.role {
            Role::User => {
                for block in &message.content {
                    if let ContentBlock::ToolResult { tool_use_id, content, .. } = block {
                        messages.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_use_id,
                            "content": content,
                        }));
                    }
                }
                let text = message.text();
                if !text.is_empty() {
                    messages.push(json!({ "role": "user", "content": text }));
                }
            }
            Role::Assistant => {
                let tool_calls: Vec<Value> = message
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolUse { id, name, input } => Some(json!({
                            "id": id,
                            "type": "function",
                            "function": { "name": name, "arguments": input.to_string() },
                        })),
                        _ => None,
                    })
                    .collect();
                let text = message.text();

                let mut entry = json!({
                    "role": "assistant",
                    "content": if text.is_empty() { Value::Null } else { Value::String(text) },
                });
                if !tool_calls.is_empty() {
                    entry["tool_calls"] = Value::Array(tool_calls);
                }
                messages.push(entry);
            }
        }
    }

    let mut body = json!({
        "model": request.model_id,
        "messages": messages,
        "stream": true,
    });
    if !request.tools.is_empty() {
        body["tools"] = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    },
                })
            })
            .collect();
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    body
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDelta>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    index: usize,
    id: Option<String>,
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

/// Incremental decoder for a chat completions event stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    tool_calls: BTreeMap<usize, ToolCallAccumulator>,
    finish_reason: Option<String>,
    finished: bool,
}

impl SseDecoder {
    /// Consume raw bytes; returns the chunks completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<ModelChunk>, ModelError> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();

            if data == "[DONE]" {
                out.extend(self.finish());
                continue;
            }
            if self.finished {
                continue;
            }

            let chunk: StreamChunk = serde_json::from_str(data)
                .map_err(|e| ModelError::Decode(format!("{e}: {data}")))?;
            for choice in chunk.choices {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        out.push(ModelChunk::TextDelta(text));
                    }
                }
                for call in choice.delta.tool_calls {
                    let acc = self.tool_calls.entry(call.index).or_default();
                    if let Some(id) = call.id {
                        acc.id = id;
                    }
                    if let Some(function) = call.function {
                        if let Some(name) = function.name {
                            acc.name.push_str(&name);
                        }
                        if let Some(arguments) = function.arguments {
                            acc.arguments.push_str(&arguments);
                        }
                    }
                }
                if choice.finish_reason.is_some() {
                    self.finish_reason = choice.finish_reason;
                }
            }
        }

        Ok(out)
    }

    /// Flush accumulated tool calls and the stop reason. Idempotent.
    pub fn finish(&mut self) -> Vec<ModelChunk> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let has_tool_calls = !self.tool_calls.is_empty();
        let mut out: Vec<ModelChunk> = std::mem::take(&mut self.tool_calls)
            .into_values()
            .map(|acc| ModelChunk::ToolUse {
                id: acc.id,
                name: acc.name,
                input: parse_arguments(&acc.arguments),
            })
            .collect();

        let stop = match self.finish_reason.as_deref() {
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            _ if has_tool_calls => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };
        out.push(ModelChunk::Stop(stop));
        out
    }
}

/// Unparseable arguments are passed through as a string so the tool's own
/// validation reports them back to the model.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
