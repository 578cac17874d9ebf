//! Chat session endpoints.
//!
//! A posted message starts one interaction cycle in a background task that
//! owns the session lock; progress is streamed to the client via SSE. The
//! task runs to completion even if the client goes away, so the transcript
//! never ends up half-updated.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::{AgentStep, StepObserver};
use crate::controller::ChatController;
use crate::session::{Credential, Session, SessionHandle};

use super::routes::AppState;
use super::types::{ChatEvent, PostMessageRequest, SessionView, SetCredentialRequest};

/// Forwards agent steps into the SSE channel.
struct ChannelObserver {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl StepObserver for ChannelObserver {
    fn on_step(&self, step: AgentStep) {
        // Receiver is gone when the client disconnected; the cycle still completes.
        let _ = self.tx.send(ChatEvent::Step { step });
    }
}

fn session_not_found(id: Uuid) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Session {} not found", id))
}

fn session_busy<T>(_: T) -> (StatusCode, String) {
    (
        StatusCode::CONFLICT,
        "session is still answering the previous message".to_string(),
    )
}

async fn session_for(state: &AppState, id: Uuid) -> Result<SessionHandle, (StatusCode, String)> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))
}

/// Start a new session seeded with the greeting.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionView>) {
    let (_, handle) = state.sessions.create().await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionView::from(&*session)))
}

/// Render a session's transcript.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let handle = session_for(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// End a session and drop its transcript.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// Set or clear the session's Groq API key.
pub async fn set_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let handle = session_for(&state, id).await?;
    let mut session = handle.try_lock().map_err(session_busy)?;
    let credential = Credential::new(req.api_key);
    tracing::info!(
        session_id = %id,
        has_credential = credential.is_some(),
        "Updated session API key"
    );
    session.set_credential(credential);
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a user message and stream the cycle's events.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "content is required".to_string()));
    }

    let handle = session_for(&state, id).await?;
    let mut session = handle.try_lock_owned().map_err(session_busy)?;
    tracing::info!(
        session_id = %id,
        content_len = req.content.len(),
        "Received chat message"
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = state.controller.clone();
    tokio::spawn(async move {
        run_cycle(&controller, &mut session, &req.content, tx).await;
    });

    let stream = async_stream::stream! {
        while let Some(ev) = rx.recv().await {
            match Event::default().event(ev.event_name()).json_data(&ev) {
                Ok(sse) => yield Ok(sse),
                Err(e) => {
                    tracing::error!(
                        session_id = %id,
                        event = %ev.event_name(),
                        error = %e,
                        "Failed to serialize SSE event; dropping"
                    );
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

/// One interaction cycle, reported as a sequence of events ending in `Done`.
async fn run_cycle(
    controller: &ChatController,
    session: &mut Session,
    content: &str,
    tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let outcome = match controller.accept_input(session, content) {
        Ok(message) => {
            let _ = tx.send(ChatEvent::UserMessage { message });
            let observer = ChannelObserver { tx: tx.clone() };
            controller.respond(session, &observer).await
        }
        Err(e) => Err(e),
    };

    let event = match outcome {
        Ok(message) => ChatEvent::AssistantMessage { message },
        Err(e) => ChatEvent::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        },
    };
    let _ = tx.send(event);
    let _ = tx.send(ChatEvent::Done);
}
