//! Groq chat completions client.
//!
//! Groq serves an OpenAI-compatible API, so requests use the standard
//! `chat/completions` body and streamed responses arrive as SSE chunks.
//!
//! SECURITY: the session's API key is only ever sent to the configured Groq
//! endpoint.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmClient, LlmError, SseDecoder, TokenCallback};
use crate::config::LlmSettings;
use crate::session::Credential;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
    stream: bool,
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

/// Error object Groq sends in place of a delta when generation fails mid-stream.
#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl From<StreamError> for LlmError {
    fn from(err: StreamError) -> Self {
        let tag = err
            .code
            .as_deref()
            .or(err.kind.as_deref())
            .unwrap_or_default();
        if tag.contains("rate_limit") {
            LlmError::RateLimited(err.message)
        } else if tag.contains("api_key") || tag.contains("authentication") {
            LlmError::Unauthorized(err.message)
        } else if tag.contains("invalid_request") {
            LlmError::BadRequest(err.message)
        } else {
            LlmError::ServiceError(err.message)
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Groq client bound to one session's credential.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Credential,
    settings: LlmSettings,
}

impl GroqClient {
    pub fn new(http: reqwest::Client, api_key: Credential, settings: LlmSettings) -> Self {
        Self {
            http,
            api_key,
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        stop: &[String],
    ) -> Result<reqwest::Response, LlmError> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            stop,
            stream: self.settings.streaming,
        };

        tracing::debug!(
            target: "llm",
            model = %self.settings.model,
            messages = messages.len(),
            streaming = self.settings.streaming,
            "Sending chat request"
        );

        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(target: "llm", %status, "Groq API returned an error");
            return Err(LlmError::from_http_status(status, error_text));
        }

        Ok(response)
    }

    async fn read_streaming(
        &self,
        response: reqwest::Response,
        on_token: TokenCallback<'_>,
    ) -> Result<String, LlmError> {
        let mut text = String::new();
        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();

        'body: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(LlmError::from_network_error)?;
            for payload in decoder.push(&chunk) {
                if apply_stream_payload(&payload, &mut text, on_token)? {
                    break 'body;
                }
            }
        }

        for payload in decoder.finish() {
            if apply_stream_payload(&payload, &mut text, on_token)? {
                break;
            }
        }

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Fold one SSE payload into the accumulated text. Returns `Ok(true)` on
/// `[DONE]` and an error when the chunk carries an upstream error object.
fn apply_stream_payload(
    payload: &str,
    text: &mut String,
    on_token: TokenCallback<'_>,
) -> Result<bool, LlmError> {
    if payload == "[DONE]" {
        return Ok(true);
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => {
            tracing::warn!(target: "llm", message = %error.message, "Groq stream reported an error");
            return Err(error.into());
        }
        Ok(chunk) => {
            if let Some(content) = chunk
                .choices
                .first()
                .and_then(|choice| choice.delta.content.as_deref())
            {
                if !content.is_empty() {
                    text.push_str(content);
                    on_token(content);
                }
            }
        }
        Err(e) => {
            tracing::trace!(target: "llm", error = %e, "Skipping unparseable stream chunk");
        }
    }
    Ok(false)
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        stop: &[String],
        on_token: TokenCallback<'_>,
    ) -> Result<String, LlmError> {
        let response = self.send(messages, stop).await?;

        if self.settings.streaming {
            return self.read_streaming(response, on_token).await;
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(LlmError::from_network_error)?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}
