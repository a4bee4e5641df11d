//! support-rag HTTP API
//!
//! 启动: cargo run --bin support-rag-web --features web
//! - POST /api/chat：{message, session_id?, previous_content?} → QueryOutcome
//! - GET /internal-docs/search?query=、GET /web-data/search?query=：本地检索目录
//!   （retrieval 的 http 模式可以直接指向本服务）
//! - GET /internal-docs/docs/{id}、GET /web-data/sources/{id}：按 id（URL 最后一段）取单个条目
//! - GET /api/health

#![cfg(feature = "web")]

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use support_rag::agent::SupportAgent;
use support_rag::config::{load_config, AppConfig};
use support_rag::core::AgentError;
use support_rag::memory::Message;
use support_rag::observability;
use support_rag::retrieval::{InternalDocsCatalog, SearchResult, WebSourceCatalog};

struct AppState {
    agent: SupportAgent,
    internal_docs: InternalDocsCatalog,
    web_sources: WebSourceCatalog,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    /// 上一条用户消息，作为单轮历史传入
    #[serde(default)]
    previous_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

fn error_response(err: AgentError) -> Response {
    match err {
        AgentError::Workflow(failure) => {
            tracing::error!("chat failed: {}", failure);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "node": failure.node,
                    "error": failure.cause.to_string(),
                })),
            )
                .into_response()
        }
        e if e.is_invalid_input() => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn api_chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let session_id = req.session_id.filter(|s| !s.is_empty());
    let history = req
        .previous_content
        .filter(|c| !c.trim().is_empty())
        .map(|c| vec![Message::user(c)]);

    match state
        .agent
        .process_in_session(session_id.as_deref(), &req.message, history)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

async fn search_internal_docs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchResult>> {
    Json(state.internal_docs.search_docs(&params.query))
}

async fn search_web_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchResult>> {
    Json(state.web_sources.search_web(&params.query))
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": format!("{} not found", what) })),
    )
        .into_response()
}

async fn get_internal_doc(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.internal_docs.get(&id) {
        Some(doc) => Json(doc).into_response(),
        None => not_found("Document"),
    }
}

async fn get_web_source(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.web_sources.get(&id) {
        Some(source) => Json(source).into_response(),
        None => not_found("Web source"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let agent = SupportAgent::from_config(&cfg).context("Failed to build support agent")?;
    let state = Arc::new(AppState {
        agent,
        internal_docs: InternalDocsCatalog::load(cfg.retrieval.internal.data_path.as_deref()),
        web_sources: WebSourceCatalog::load(cfg.retrieval.web.data_path.as_deref()),
    });

    let app = Router::new()
        .route("/api/chat", post(api_chat))
        .route("/internal-docs/search", get(search_internal_docs))
        .route("/web-data/search", get(search_web_data))
        .route("/internal-docs/docs/:id", get(get_internal_doc))
        .route("/web-data/sources/:id", get(get_web_source))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!("support-rag-web listening on http://{}", cfg.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
