//! LLM client abstraction and the Groq implementation.

mod error;
mod groq;
mod sse;

pub use error::LlmError;
pub use groq::GroqClient;
pub use sse::SseDecoder;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message sent to the chat completions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the chat completions wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Receives text deltas while a completion is streaming.
pub type TokenCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// A chat model the agent can reason with.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return its full text.
    ///
    /// Generation halts at the first occurrence of any `stop` sequence. When
    /// the client streams, every text delta is passed to `on_token` before
    /// the call returns.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        stop: &[String],
        on_token: TokenCallback<'_>,
    ) -> Result<String, LlmError>;
}
