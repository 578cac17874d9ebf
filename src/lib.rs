//! # Search Chat
//!
//! A web chat assistant that answers questions by searching the web.
//!
//! This library provides:
//! - An HTTP API with per-session transcripts and streamed replies
//! - A zero-shot ReAct agent that calls search tools in a loop
//! - A streaming client for Groq's OpenAI-compatible chat API
//!
//! ## Architecture
//!
//! Each submitted message runs one interaction cycle:
//! 1. Append the user's message to the session transcript
//! 2. Without an API key, stop and ask for one
//! 3. Otherwise build an agent with the key and run it over the transcript
//! 4. Append the agent's final answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use search_chat::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod controller;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
