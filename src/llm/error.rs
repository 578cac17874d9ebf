//! Typed errors for LLM operations

use thiserror::Error;

/// LLM operation errors with typed variants
///
/// Lets the chat layer tell a rejected API key apart from a transient outage
/// without string matching.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key is missing, expired or invalid (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Malformed request (HTTP 400), e.g. an unknown model id
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Server-side error (HTTP 5xx)
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Network connectivity issue (connection refused, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// The model returned no text at all
    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LlmError {
    /// Check if this error is worth retrying after a delay
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited(_) | LlmError::ServiceError(_) | LlmError::Network(_)
        )
    }

    /// Convert HTTP status code and error text into typed LlmError
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Unauthorized(error_text),
            429 => LlmError::RateLimited(error_text),
            400 => LlmError::BadRequest(error_text),
            500..=599 => LlmError::ServiceError(error_text),
            _ => LlmError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert network/connection errors into typed LlmError
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            LlmError::Network(format!("Connection failed: {}", e))
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else {
            LlmError::Other(e.into())
        }
    }
}
