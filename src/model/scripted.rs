//! A provider that replays canned turns, one per request.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ChunkStream, ModelChunk, ModelError, ModelProvider, ModelRequest, StopReason};

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    Chunks(Vec<ModelChunk>),
    /// Yields the chunks, then fails mid-stream.
    Fail(Vec<ModelChunk>, String),
}

pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A turn that streams `text` word by word and ends the conversation.
    pub fn text_turn(text: &str) -> ScriptedTurn {
        let mut chunks: Vec<ModelChunk> = text
            .split_inclusive(' ')
            .map(|piece| ModelChunk::TextDelta(piece.to_string()))
            .collect();
        chunks.push(ModelChunk::Stop(StopReason::EndTurn));
        ScriptedTurn::Chunks(chunks)
    }

    /// A turn that requests a single tool call.
    pub fn tool_turn(id: &str, name: &str, input: serde_json::Value) -> ScriptedTurn {
        ScriptedTurn::Chunks(vec![
            ModelChunk::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            },
            ModelChunk::Stop(StopReason::ToolUse),
        ])
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().map(|turns| turns.len()).unwrap_or(0)
    }
}

impl ModelProvider for ScriptedProvider {
    fn stream(&self, request: ModelRequest) -> ChunkStream {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.turns.lock().ok().and_then(|mut turns| turns.pop_front());

        let items: Vec<Result<ModelChunk, ModelError>> = match next {
            Some(ScriptedTurn::Chunks(chunks)) => chunks.into_iter().map(Ok).collect(),
            Some(ScriptedTurn::Fail(chunks, message)) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(ModelError::Script(message))))
                .collect(),
            None => vec![Err(ModelError::Script("script exhausted".into()))],
        };
        Box::pin(futures::stream::iter(items))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn request() -> ModelRequest {
        ModelRequest {
            model_id: "scripted".into(),
            system: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            temperature: None,
        }
    }

    #[tokio::test]
    async fn replays_turns_in_order() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::text_turn("one two"),
            ScriptedProvider::text_turn("three"),
        ]);

        let first: Vec<_> = provider.stream(request()).collect().await;
        assert_eq!(first.len(), 3);
        assert!(matches!(&first[0], Ok(ModelChunk::TextDelta(t)) if t == "one "));
        assert!(matches!(&first[1], Ok(ModelChunk::TextDelta(t)) if t == "two"));

        let second: Vec<_> = provider.stream(request()).collect().await;
        assert!(matches!(&second[0], Ok(ModelChunk::TextDelta(t)) if t == "three"));

        assert_eq!(provider.requests().len(), 2);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let provider = ScriptedProvider::new(Vec::new());
        let items: Vec<_> = provider.stream(request()).collect().await;
        assert!(matches!(&items[..], [Err(ModelError::Script(_))]));
    }
}
