//! Router and shared application state.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::agent::AgentFactory;
use crate::config::Config;
use crate::controller::ChatController;
use crate::session::SessionStore;
use crate::tools::{ToolDescriptor, ToolRegistry};

use super::chat;
use super::types::HealthResponse;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// State shared by every handler.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub controller: Arc<ChatController>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(config: Config, agents: Arc<dyn AgentFactory>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            controller: Arc::new(ChatController::new(agents)),
            tools,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/sessions", post(chat::create_session))
        .route(
            "/api/sessions/:id",
            get(chat::get_session).delete(chat::delete_session),
        )
        .route("/api/sessions/:id/credential", put(chat::set_credential))
        .route("/api/sessions/:id/messages", post(chat::post_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.llm.model.clone(),
    })
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolDescriptor>> {
    Json(state.tools.list_tools())
}
