//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentStep;
use crate::session::{Message, Session};

/// Request to post a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    /// The user's question
    pub content: String,
}

/// Request to set (or clear, when blank) the session's API key.
#[derive(Debug, Clone, Deserialize)]
pub struct SetCredentialRequest {
    pub api_key: String,
}

/// Rendered state of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,

    /// Transcript, oldest first
    pub messages: Vec<Message>,

    /// Whether an API key is set (the key itself is never returned)
    pub has_credential: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            messages: session.transcript.messages().to_vec(),
            has_credential: session.credential().is_some(),
        }
    }
}

/// Server-Sent Event payloads for one interaction cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// The user's message was appended
    UserMessage { message: Message },
    /// Intermediate agent progress
    Step { step: AgentStep },
    /// The assistant's reply was appended
    AssistantMessage { message: Message },
    /// The cycle ended without a reply
    Error { kind: String, message: String },
    /// No more events for this cycle
    Done,
}

impl ChatEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::UserMessage { .. } => "user_message",
            ChatEvent::Step { .. } => "step",
            ChatEvent::AssistantMessage { .. } => "assistant_message",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Done => "done",
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Model the agent reasons with
    pub model: String,
}
