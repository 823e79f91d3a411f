//! Server wiring: the MCP stdio server, the HTTP server, and the background
//! server used for in-process HTTP access.
//!
//! The HTTP router serves:
//! - `POST /invocations`: `{"prompt": ".."}` in, chunked `text/plain` out
//! - `GET /health`
//! - `/mcp`: the booking tools over streamable HTTP

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use rmcp::ServiceExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::agent::{text_chunks, Agent};
use crate::booking::{store, BookingTable};
use crate::config::RestobotConfig;
use crate::db;
use crate::knowledge;
use crate::model::openai::OpenAiCompatProvider;
use crate::model::ModelProvider;
use crate::tools::mcp::RestobotMcp;
use crate::tools::BookingTools;

/// Open the database, make sure the booking table exists, and build the tool
/// handler around the shared connection.
pub fn open_tools(
    config: &RestobotConfig,
) -> Result<(Arc<Mutex<rusqlite::Connection>>, BookingTools)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    let table = BookingTable::new(config.storage.table_name.clone())
        .context("invalid storage.table_name")?;
    store::ensure_table(&conn, &table).context("failed to create booking table")?;
    tracing::info!(db = %db_path.display(), table = %table, "booking store ready");

    let db = Arc::new(Mutex::new(conn));
    let kb = knowledge::create_knowledge_base(&config.knowledge_base, Arc::clone(&db))?;
    tracing::info!(
        kb_id = %kb.id(),
        provider = %config.knowledge_base.provider,
        "knowledge base ready"
    );

    let tools = BookingTools::new(
        Arc::clone(&db),
        table,
        kb,
        config.knowledge_base.max_results,
    );
    Ok((db, tools))
}

/// The configured OpenAI-compatible provider.
pub fn default_provider(config: &RestobotConfig) -> Result<Arc<dyn ModelProvider>> {
    let provider = OpenAiCompatProvider::from_config(&config.model)
        .context("failed to create model provider")?;
    tracing::info!(
        model = %config.model.model_id,
        endpoint = %config.model.endpoint,
        "model provider ready"
    );
    Ok(Arc::new(provider))
}

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
    pub tools: BookingTools,
}

impl AppState {
    pub fn new(
        config: &RestobotConfig,
        tools: BookingTools,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        let agent = Agent::from_config(config, provider, tools.registry()).build();
        Self { agent, tools }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvocationRequest {
    pub prompt: String,
}

/// `POST /invocations` and `GET /health`.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/invocations", post(invocations))
        .route("/health", get(health))
        .with_state(state)
}

async fn invocations(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> Response {
    if request.prompt.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "prompt must not be empty").into_response();
    }
    tracing::info!(prompt_len = request.prompt.len(), "invocation received");

    // Each request is its own conversation.
    let events = state.agent.fresh().stream(request.prompt);
    let body = Body::from_stream(text_chunks(events).map(Ok::<_, Infallible>));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.agent.model_id(),
        "table": state.tools.table().name(),
        "tools": state.agent.tools().names(),
    }))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: RestobotConfig) -> Result<()> {
    tracing::info!("starting restobot MCP server on stdio");

    let (_db, tools) = open_tools(&config)?;
    let server = RestobotMcp::new(tools)
        .serve(rmcp::transport::stdio())
        .await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");
    Ok(())
}

/// Start the HTTP server: invocations, health and MCP.
pub async fn serve_http(config: RestobotConfig, provider: Arc<dyn ModelProvider>) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting restobot HTTP server");

    let (_db, tools) = open_tools(&config)?;
    let state = AppState::new(&config, tools.clone(), provider);

    let mcp = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(RestobotMcp::new(tools.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );
    let router = app_router(state).nest_service("/mcp", mcp);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/invocations");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("background server already started")]
    AlreadyStarted,

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Once-only startup guard for the background server. Held by the caller,
/// so two guards can run two servers but one guard never starts twice.
#[derive(Debug, Default)]
pub struct ServerGuard {
    started: AtomicBool,
}

/// A server running on a spawned task.
#[derive(Debug)]
pub struct BackgroundServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl BackgroundServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl ServerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Serve `router` on `listener` in the background. Fails with
    /// [`ServerError::AlreadyStarted`] on every call after the first success.
    pub fn spawn_background(
        &self,
        listener: TcpListener,
        router: Router,
    ) -> Result<BackgroundServer, ServerError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ServerError::AlreadyStarted);
        }

        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "background server failed");
            }
        });
        tracing::info!(addr = %addr, "background server started");

        Ok(BackgroundServer { addr, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_allows_one_start() {
        let guard = ServerGuard::new();
        assert!(!guard.is_started());

        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = guard.spawn_background(first, Router::new()).unwrap();
        assert!(guard.is_started());
        assert!(server.url("/health").starts_with("http://127.0.0.1:"));

        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let err = guard.spawn_background(second, Router::new()).unwrap_err();
        assert!(matches!(err, ServerError::AlreadyStarted));

        server.shutdown();
    }
}
