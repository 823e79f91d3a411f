mod helpers;

use futures::StreamExt;
use restobot::agent::{forward_text, text_chunks, AgentEvent, EventKind};
use restobot::model::scripted::{ScriptedProvider, ScriptedTurn};
use restobot::model::{ModelChunk, StopReason};
use serde_json::json;

fn retrieve_then_answer() -> Vec<ScriptedTurn> {
    vec![
        ScriptedProvider::tool_turn("r1", "retrieve", json!({"query": "pasta"})),
        ScriptedProvider::text_turn("<answer>Try Nonna's Kitchen.</answer>"),
    ]
}

#[tokio::test]
async fn pull_stream_orders_events() {
    let tools = helpers::test_tools();
    let (agent, _) = helpers::scripted_agent(&tools, retrieve_then_answer());

    let events: Vec<AgentEvent> = agent.stream("Where can I get pasta?").collect().await;
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();

    let selected = kinds.iter().position(|k| *k == EventKind::ToolSelection).unwrap();
    let result = kinds.iter().position(|k| *k == EventKind::ToolResult).unwrap();
    let first_text = kinds.iter().position(|k| *k == EventKind::Text).unwrap();
    assert!(selected < result && result < first_text);

    assert_eq!(kinds.last(), Some(&EventKind::Result));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn forward_text_sees_every_text_event() {
    let tools = helpers::test_tools();
    let (agent, _) = helpers::scripted_agent(&tools, retrieve_then_answer());

    let mut forwarded = String::new();
    let last = forward_text(agent.stream("pasta?"), |t| forwarded.push_str(t)).await;

    assert_eq!(forwarded, "<answer>Try Nonna's Kitchen.</answer>");
    match last {
        Some(AgentEvent::Result { text, stop_reason, turns }) => {
            assert_eq!(text, forwarded);
            assert_eq!(stop_reason, StopReason::EndTurn);
            assert_eq!(turns, 2);
        }
        other => panic!("expected result, got {other:?}"),
    }
}

#[tokio::test]
async fn push_mode_handler_runs_inline() {
    let tools = helpers::test_tools();
    let (agent, _) = helpers::scripted_agent(&tools, retrieve_then_answer());

    let mut texts = Vec::new();
    let mut tools_seen = Vec::new();
    let result = agent
        .invoke_with("pasta?", |event| match event {
            AgentEvent::TextDelta { data } => texts.push(data.clone()),
            AgentEvent::ToolSelected { name, .. } => tools_seen.push(name.clone()),
            _ => {}
        })
        .await
        .unwrap();

    assert_eq!(texts.concat(), result.text);
    assert_eq!(tools_seen, vec!["retrieve".to_string()]);
}

#[tokio::test]
async fn model_fault_ends_text_stream_with_error_chunk() {
    let tools = helpers::test_tools();
    let (agent, _) = helpers::scripted_agent(
        &tools,
        vec![ScriptedTurn::Fail(
            vec![ModelChunk::TextDelta("Let me ".into())],
            "upstream timeout".into(),
        )],
    );

    let chunks: Vec<String> = text_chunks(agent.stream("hi")).collect().await;
    assert_eq!(chunks[0], "Let me ");
    assert!(chunks.last().unwrap().starts_with("\n[error] "));
    assert!(chunks.last().unwrap().contains("upstream timeout"));
    assert!(agent.history().await.is_empty());
}

#[tokio::test]
async fn slow_consumer_still_receives_everything() {
    let tools = helpers::test_tools();
    let long_answer = (0..200).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let (agent, _) =
        helpers::scripted_agent(&tools, vec![ScriptedProvider::text_turn(&long_answer)]);

    let mut stream = agent.stream("talk");
    let mut collected = String::new();
    while let Some(event) = stream.next().await {
        if let Some(t) = event.text() {
            collected.push_str(t);
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(collected, long_answer);
}
