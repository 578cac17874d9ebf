//! HTTP API for the chat service.
//!
//! ## Endpoints
//!
//! - `GET /` - Chat page
//! - `GET /api/health` - Health check
//! - `GET /api/tools` - Search tools the agent may call
//! - `POST /api/sessions` - Start a session
//! - `GET /api/sessions/:id` - Session transcript
//! - `DELETE /api/sessions/:id` - End a session
//! - `PUT /api/sessions/:id/credential` - Set or clear the Groq API key
//! - `POST /api/sessions/:id/messages` - Ask a question (SSE stream)

mod chat;
mod routes;
pub mod types;

pub use routes::{router, AppState};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::agent::GroqAgentFactory;
use crate::config::Config;
use crate::tools::ToolRegistry;

const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the HTTP server and block until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let tools = Arc::new(ToolRegistry::standard(&config.tools)?);
    let agents = Arc::new(GroqAgentFactory::new(config.llm.clone(), tools.clone()));
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, agents, tools));

    spawn_session_reaper(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Periodically drop sessions idle for longer than the configured TTL.
fn spawn_session_reaper(state: Arc<AppState>) {
    let ttl = state.config.session_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_INTERVAL);
        loop {
            interval.tick().await;
            state.sessions.reap_idle(ttl).await;
        }
    });
}
