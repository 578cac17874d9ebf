//! Core ReAct loop implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{ChatMessage, LlmClient};
use crate::session::Message;
use crate::tools::ToolRegistry;

use super::observer::{AgentStep, StepObserver};
use super::output_parser::{self, ParsedOutput};
use super::prompt::{build_prompt, render_transcript, ScratchpadEntry};
use super::{AgentError, ReasoningAgent};

/// Answer returned when the iteration cap is hit.
pub const STOPPED_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Tunables for one agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentOptions {
    pub max_iterations: usize,
    /// Feed malformed model output back as an observation instead of failing.
    pub handle_parsing_errors: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            handle_parsing_errors: true,
        }
    }
}

/// Zero-shot ReAct agent: reasons about a single question with tools.
pub struct ReactAgent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    options: AgentOptions,
    stop: Vec<String>,
}

impl ReactAgent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, options: AgentOptions) -> Self {
        Self {
            llm,
            tools,
            options,
            stop: vec!["\nObservation:".to_string(), "\n\tObservation:".to_string()],
        }
    }

    /// Run the loop for one question.
    pub async fn answer(
        &self,
        input: &str,
        observer: &dyn StepObserver,
    ) -> Result<String, AgentError> {
        let mut scratchpad: Vec<ScratchpadEntry> = Vec::new();
        let on_token = |text: &str| {
            observer.on_step(AgentStep::Token {
                text: text.to_string(),
            })
        };

        for iteration in 0..self.options.max_iterations {
            tracing::debug!(iteration = iteration + 1, "Agent iteration");

            let prompt = build_prompt(input, &self.tools, &scratchpad);
            let output = self
                .llm
                .complete(&[ChatMessage::user(prompt)], &self.stop, &on_token)
                .await?;

            match output_parser::parse(&output) {
                Ok(ParsedOutput::Finish { answer }) => {
                    tracing::debug!(iterations = iteration + 1, "Agent finished");
                    observer.on_step(AgentStep::Finish {
                        answer: answer.clone(),
                    });
                    return Ok(answer);
                }
                Ok(ParsedOutput::Action { tool, input, log }) => {
                    let thought = thought_of(&log);
                    if !thought.is_empty() {
                        observer.on_step(AgentStep::Thought {
                            text: thought.to_string(),
                        });
                    }
                    let observation = self.run_tool(&tool, &input, observer).await?;
                    scratchpad.push(ScratchpadEntry { log, observation });
                }
                Err(e) => {
                    if !self.options.handle_parsing_errors {
                        return Err(AgentError::OutputParsing(e.message));
                    }
                    tracing::debug!(error = %e, "Recovering from unparseable model output");
                    observer.on_step(AgentStep::InvalidOutput {
                        message: e.observation.clone(),
                    });
                    scratchpad.push(ScratchpadEntry {
                        log: output,
                        observation: e.observation,
                    });
                }
            }
        }

        tracing::warn!(
            max_iterations = self.options.max_iterations,
            "Agent hit iteration limit"
        );
        observer.on_step(AgentStep::Finish {
            answer: STOPPED_ANSWER.to_string(),
        });
        Ok(STOPPED_ANSWER.to_string())
    }

    /// Execute one tool call and return the observation.
    async fn run_tool(
        &self,
        name: &str,
        input: &str,
        observer: &dyn StepObserver,
    ) -> Result<String, AgentError> {
        observer.on_step(AgentStep::ToolStart {
            tool: name.to_string(),
            input: input.to_string(),
        });

        let observation = match self.tools.get(name) {
            Some(tool) => {
                tracing::info!(tool = %name, "Calling tool");
                tool.run(input).await.map_err(|e| AgentError::Tool {
                    tool: name.to_string(),
                    message: format!("{:#}", e),
                })?
            }
            None => format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tools.names().join(", ")
            ),
        };

        observer.on_step(AgentStep::ToolEnd {
            tool: name.to_string(),
            output: observation.clone(),
        });
        Ok(observation)
    }
}

#[async_trait]
impl ReasoningAgent for ReactAgent {
    async fn run(
        &self,
        transcript: &[Message],
        observer: &dyn StepObserver,
    ) -> Result<String, AgentError> {
        self.answer(&render_transcript(transcript), observer).await
    }
}

/// Reasoning text that precedes the `Action:` line.
fn thought_of(log: &str) -> &str {
    log.find("Action")
        .map(|idx| &log[..idx])
        .unwrap_or(log)
        .trim()
}
