//! Configuration management for search-chat.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `GROQ_MODEL` - Optional. Model identifier sent to Groq. Defaults to `llama3-8b-8192`.
//! - `GROQ_API_URL` - Optional. Chat completions endpoint. Defaults to the public Groq API.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `15`.
//! - `SESSION_TTL_SECS` - Optional. Idle time before a chat session is dropped. Defaults to `3600`.
//! - `TOOL_TIMEOUT_SECS` - Optional. HTTP timeout for lookup tools. Defaults to `30`.
//!
//! The Groq API key is deliberately not part of this configuration: each chat
//! session supplies its own key through the sidebar.

use std::time::Duration;
use thiserror::Error;

/// Official Groq OpenAI-compatible chat completions endpoint.
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used when `GROQ_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the language model behind the agent.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Chat completions endpoint (OpenAI wire format)
    pub api_url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Stream tokens back as they are generated
    pub streaming: bool,

    /// Maximum reasoning iterations before the agent gives up
    pub max_iterations: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GROQ_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            streaming: true,
            max_iterations: 15,
        }
    }
}

/// Settings shared by the lookup tools.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Per-request timeout for tool HTTP calls
    pub timeout: Duration,

    /// User agent presented to search providers
    pub user_agent: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Mozilla/5.0 (compatible; search-chat/{})", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Language model settings
    pub llm: LlmSettings,

    /// Lookup tool settings
    pub tools: ToolSettings,

    /// Idle lifetime of a chat session
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_env("PORT", 3000u16)?;

        let model = std::env::var("GROQ_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_url = std::env::var("GROQ_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GROQ_API_URL.to_string());

        let max_iterations = parse_env("MAX_ITERATIONS", 15usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let session_ttl = Duration::from_secs(parse_env("SESSION_TTL_SECS", 3600u64)?);
        let tool_timeout = Duration::from_secs(parse_env("TOOL_TIMEOUT_SECS", 30u64)?);

        Ok(Self {
            host,
            port,
            llm: LlmSettings {
                api_url,
                model,
                max_iterations,
                ..LlmSettings::default()
            },
            tools: ToolSettings {
                timeout: tool_timeout,
                ..ToolSettings::default()
            },
            session_ttl,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            llm: LlmSettings::default(),
            tools: ToolSettings::default(),
            session_ttl: Duration::from_secs(3600),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_groq_setup() {
        let config = Config::new("127.0.0.1", 3000);
        assert_eq!(config.llm.model, "llama3-8b-8192");
        assert_eq!(config.llm.api_url, DEFAULT_GROQ_API_URL);
        assert!(config.llm.streaming);
        assert_eq!(config.llm.max_iterations, 15);
        assert_eq!(config.tools.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_env_falls_back_when_unset() {
        let value: u16 = parse_env("SEARCH_CHAT_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SEARCH_CHAT_TEST_BAD_PORT", "not-a-port");
        let err = parse_env::<u16>("SEARCH_CHAT_TEST_BAD_PORT", 3000).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "SEARCH_CHAT_TEST_BAD_PORT"));
        std::env::remove_var("SEARCH_CHAT_TEST_BAD_PORT");
    }
}
