//! Adapters from an event stream to plain text.

use futures::{Stream, StreamExt};

use super::events::AgentEvent;

/// Pass every text-bearing event to `observer`, in order. Returns the terminal
/// event (`Result` or `ForceStop`), or `None` if the stream ended without one.
pub async fn forward_text<S, F>(events: S, mut observer: F) -> Option<AgentEvent>
where
    S: Stream<Item = AgentEvent>,
    F: FnMut(&str),
{
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        if let Some(text) = event.text() {
            observer(text);
        }
        if event.is_terminal() {
            return Some(event);
        }
    }
    None
}

/// Text chunks for a streaming response body.
///
/// A `ForceStop`, or a stream that ends without a terminal event, is turned
/// into a trailing `\n[error] <message>` chunk.
pub fn text_chunks<S>(events: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = AgentEvent> + Send + 'static,
{
    async_stream::stream! {
        futures::pin_mut!(events);
        let mut finished = false;
        while let Some(event) = events.next().await {
            match event {
                AgentEvent::TextDelta { data } => yield data,
                AgentEvent::Result { .. } => {
                    finished = true;
                    break;
                }
                AgentEvent::ForceStop { reason } => {
                    tracing::error!(reason = %reason, "invocation stopped mid-stream");
                    finished = true;
                    yield format!("\n[error] {reason}");
                    break;
                }
                _ => {}
            }
        }
        if !finished {
            tracing::error!("event stream ended without a result");
            yield "\n[error] agent stopped unexpectedly".to_string();
        }
    }
}
