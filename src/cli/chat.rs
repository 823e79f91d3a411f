//! CLI `chat` command: run one prompt through the agent and print the
//! answer as it streams.

use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

use restobot::agent::{Agent, AgentEvent};
use restobot::config::RestobotConfig;
use restobot::model::scripted::ScriptedProvider;
use restobot::model::ModelProvider;
use restobot::server::{self, AppState, ServerGuard};

/// A canned two-turn script: search the knowledge base for the prompt, then
/// answer. Lets the tool path run without a model endpoint.
fn offline_provider(prompt: &str) -> Arc<dyn ModelProvider> {
    Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tool_turn("offline-1", "retrieve", json!({ "query": prompt })),
        ScriptedProvider::text_turn(
            "<answer>Offline mode: the passages above are what the knowledge base has \
             on this.</answer>",
        ),
    ]))
}

pub async fn chat(config: &RestobotConfig, prompt: &str, offline: bool, http: bool) -> Result<()> {
    let (_db, tools) = server::open_tools(config)?;
    let provider = if offline {
        offline_provider(prompt)
    } else {
        server::default_provider(config)?
    };

    if http {
        return chat_over_http(config, tools, provider, prompt).await;
    }

    let agent = Agent::from_config(config, provider, tools.registry()).build();
    let mut stdout = std::io::stdout();

    let result = agent
        .invoke_with(prompt, |event| match event {
            AgentEvent::TextDelta { data } => {
                print!("{data}");
                let _ = stdout.flush();
            }
            AgentEvent::ToolSelected { name, input, .. } => {
                eprintln!("\n[tool] {name} {input}");
            }
            AgentEvent::ToolResult { name, outcome, .. } => {
                eprintln!("[tool] {name} -> {}", outcome.to_text());
            }
            AgentEvent::ForceStop { reason } => eprintln!("\n[stopped] {reason}"),
            _ => {}
        })
        .await?;

    println!();
    println!();
    println!("Answer: {}", result.answer(agent.answer_tag()));
    Ok(())
}

/// Start the HTTP app on an ephemeral port and stream the prompt through
/// `POST /invocations`.
async fn chat_over_http(
    config: &RestobotConfig,
    tools: restobot::tools::BookingTools,
    provider: Arc<dyn ModelProvider>,
    prompt: &str,
) -> Result<()> {
    let state = AppState::new(config, tools, provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;

    let guard = ServerGuard::new();
    let server = guard.spawn_background(listener, server::app_router(state))?;

    let response = reqwest::Client::new()
        .post(server.url("/invocations"))
        .json(&json!({ "prompt": prompt }))
        .send()
        .await
        .context("invocation request failed")?;
    anyhow::ensure!(
        response.status().is_success(),
        "invocation failed with HTTP {}",
        response.status()
    );

    let mut body = response.bytes_stream();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.context("error reading response stream")?;
        stdout.write_all(&chunk)?;
        stdout.flush()?;
    }
    println!();

    server.shutdown();
    Ok(())
}
