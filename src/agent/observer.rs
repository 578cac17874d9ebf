//! Progress reporting from a running agent.

use std::sync::Mutex;

use serde::Serialize;

/// An intermediate step, emitted while the agent works towards an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentStep {
    /// Raw text delta from the model
    Token { text: String },
    /// Reasoning the model wrote before choosing an action
    Thought { text: String },
    /// A tool is about to run
    ToolStart { tool: String, input: String },
    /// A tool (or the unknown-tool fallback) produced an observation
    ToolEnd { tool: String, output: String },
    /// Model output could not be parsed; the error is fed back to it
    InvalidOutput { message: String },
    /// The agent settled on a final answer
    Finish { answer: String },
}

/// Receives agent steps as they happen.
pub trait StepObserver: Send + Sync {
    fn on_step(&self, step: AgentStep);
}

/// Discards every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&self, _step: AgentStep) {}
}

/// Keeps every step in order, for inspection after a run.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    steps: Mutex<Vec<AgentStep>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<AgentStep> {
        self.steps
            .lock()
            .map(|steps| steps.clone())
            .unwrap_or_default()
    }

    /// Steps other than raw tokens.
    pub fn structural_steps(&self) -> Vec<AgentStep> {
        self.steps()
            .into_iter()
            .filter(|s| !matches!(s, AgentStep::Token { .. }))
            .collect()
    }
}

impl StepObserver for RecordingObserver {
    fn on_step(&self, step: AgentStep) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push(step);
        }
    }
}
