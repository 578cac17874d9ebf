//! Agent module - the reasoning agent behind every assistant reply.
//!
//! The agent follows the zero-shot ReAct pattern:
//! 1. Build a prompt with the tool list and the question
//! 2. Call the LLM, parse `Action` / `Action Input` or `Final Answer`
//! 3. If an action was chosen, run the tool and append the observation
//! 4. Repeat until a final answer or the iteration cap

mod agent_loop;
mod observer;
mod output_parser;
mod prompt;

pub use agent_loop::{AgentOptions, ReactAgent, STOPPED_ANSWER};
pub use observer::{AgentStep, NoopObserver, RecordingObserver, StepObserver};
pub use output_parser::{parse as parse_output, ParseError, ParsedOutput};
pub use prompt::{build_prompt, render_transcript};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmSettings;
use crate::llm::{GroqClient, LlmError};
use crate::session::{Credential, Message};
use crate::tools::ToolRegistry;

/// Failures that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("{0}")]
    OutputParsing(String),
}

/// Something that turns a transcript into one final answer.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    async fn run(
        &self,
        transcript: &[Message],
        observer: &dyn StepObserver,
    ) -> Result<String, AgentError>;
}

/// Builds a fresh agent for each interaction cycle.
pub trait AgentFactory: Send + Sync {
    fn build(&self, credential: &Credential) -> Arc<dyn ReasoningAgent>;
}

/// Production factory: a Groq-backed ReAct agent with the shared tool set.
pub struct GroqAgentFactory {
    http: reqwest::Client,
    settings: LlmSettings,
    tools: Arc<ToolRegistry>,
}

impl GroqAgentFactory {
    pub fn new(settings: LlmSettings, tools: Arc<ToolRegistry>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            tools,
        }
    }
}

impl AgentFactory for GroqAgentFactory {
    fn build(&self, credential: &Credential) -> Arc<dyn ReasoningAgent> {
        let llm = GroqClient::new(self.http.clone(), credential.clone(), self.settings.clone());
        tracing::debug!(model = %llm.model(), tools = self.tools.len(), "Building search agent");
        Arc::new(ReactAgent::new(
            Arc::new(llm),
            self.tools.clone(),
            AgentOptions {
                max_iterations: self.settings.max_iterations,
                handle_parsing_errors: true,
            },
        ))
    }
}
