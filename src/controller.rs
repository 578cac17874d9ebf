//! Chat session controller.
//!
//! Runs one interaction cycle for a session: accept the user's message, gate
//! on the credential, ask the agent, record its answer. The caller holds the
//! session exclusively for the whole cycle.

use std::sync::Arc;

use thiserror::Error;

use crate::agent::{AgentError, AgentFactory, StepObserver};
use crate::session::{Message, Session};

/// Shown when a message arrives before an API key was entered.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Please enter your Groq API Key in the sidebar to continue.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyInput,

    #[error("Please enter your Groq API Key in the sidebar to continue.")]
    MissingCredential,

    #[error("Search agent failed: {0}. Check your API key and try again.")]
    Upstream(#[from] AgentError),
}

impl ChatError {
    /// Category shown to the user: fixable settings vs. a failed upstream call.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::EmptyInput | ChatError::MissingCredential => "configuration",
            ChatError::Upstream(_) => "upstream",
        }
    }
}

pub struct ChatController {
    agents: Arc<dyn AgentFactory>,
}

impl ChatController {
    pub fn new(agents: Arc<dyn AgentFactory>) -> Self {
        Self { agents }
    }

    /// Append a user message. Blank input leaves the transcript untouched.
    pub fn accept_input(&self, session: &mut Session, input: &str) -> Result<Message, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let message = Message::user(input);
        session.transcript.push(message.clone());
        tracing::debug!(
            session_id = %session.id,
            transcript_len = session.transcript.len(),
            "Accepted user message"
        );
        Ok(message)
    }

    /// Answer the transcript as it stands and append the assistant reply.
    ///
    /// Without a credential the agent is never built. Agent failures are
    /// returned as `ChatError::Upstream` and leave the transcript unchanged.
    pub async fn respond(
        &self,
        session: &mut Session,
        observer: &dyn StepObserver,
    ) -> Result<Message, ChatError> {
        let Some(credential) = session.credential() else {
            tracing::info!(session_id = %session.id, "Message received without API key");
            return Err(ChatError::MissingCredential);
        };

        let agent = self.agents.build(credential);
        let answer = match agent.run(session.transcript.messages(), observer).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Search agent failed");
                return Err(ChatError::Upstream(e));
            }
        };

        let message = Message::assistant(answer);
        session.transcript.push(message.clone());
        tracing::info!(
            session_id = %session.id,
            transcript_len = session.transcript.len(),
            "Assistant replied"
        );
        Ok(message)
    }

    /// Run a full cycle: `accept_input` followed by `respond`.
    pub async fn submit(
        &self,
        session: &mut Session,
        input: &str,
        observer: &dyn StepObserver,
    ) -> Result<Message, ChatError> {
        self.accept_input(session, input)?;
        self.respond(session, observer).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::{AgentStep, NoopObserver, ReasoningAgent, RecordingObserver};
    use crate::llm::LlmError;
    use crate::session::{Credential, Role, GREETING};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Agent that answers with the last user message, reporting one step.
    pub(crate) struct EchoAgent;

    #[async_trait]
    impl ReasoningAgent for EchoAgent {
        async fn run(
            &self,
            transcript: &[Message],
            observer: &dyn StepObserver,
        ) -> Result<String, AgentError> {
            let last = transcript
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            observer.on_step(AgentStep::Thought {
                text: format!("thinking about {}", last),
            });
            Ok(format!("answer to {}", last))
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl ReasoningAgent for FailingAgent {
        async fn run(
            &self,
            _transcript: &[Message],
            _observer: &dyn StepObserver,
        ) -> Result<String, AgentError> {
            Err(AgentError::Llm(LlmError::Unauthorized(
                "Invalid API Key".to_string(),
            )))
        }
    }

    /// Counts builds so tests can tell whether the credential gate held.
    #[derive(Default)]
    pub(crate) struct CountingFactory {
        pub(crate) builds: AtomicUsize,
        fail: bool,
    }

    impl AgentFactory for CountingFactory {
        fn build(&self, _credential: &Credential) -> Arc<dyn ReasoningAgent> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Arc::new(FailingAgent)
            } else {
                Arc::new(EchoAgent)
            }
        }
    }

    fn session_with_key() -> Session {
        let mut session = Session::new(Uuid::new_v4());
        session.set_credential(Credential::new("gsk_test"));
        session
    }

    #[tokio::test]
    async fn missing_credential_appends_user_only() {
        let factory = Arc::new(CountingFactory::default());
        let controller = ChatController::new(factory.clone());
        let mut session = Session::new(Uuid::new_v4());

        let err = controller
            .submit(&mut session, "What is machine learning?", &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::MissingCredential));
        assert_eq!(err.to_string(), MISSING_CREDENTIAL_MESSAGE);
        assert_eq!(err.kind(), "configuration");
        assert_eq!(
            session.transcript.messages(),
            &[
                Message::assistant(GREETING),
                Message::user("What is machine learning?")
            ]
        );
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn credential_present_appends_assistant_reply() {
        let controller = ChatController::new(Arc::new(CountingFactory::default()));
        let mut session = session_with_key();
        let observer = RecordingObserver::new();

        let reply = controller
            .submit(&mut session, "What is machine learning?", &observer)
            .await
            .unwrap();

        assert_eq!(reply, Message::assistant("answer to What is machine learning?"));
        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.transcript.last(), Some(&reply));
        assert_eq!(observer.steps().len(), 1);
    }

    #[tokio::test]
    async fn sequential_submissions_interleave_in_order() {
        let controller = ChatController::new(Arc::new(CountingFactory::default()));
        let mut session = session_with_key();

        for input in ["first", "second"] {
            controller
                .submit(&mut session, input, &NoopObserver)
                .await
                .unwrap();
        }

        assert_eq!(
            session.transcript.messages(),
            &[
                Message::assistant(GREETING),
                Message::user("first"),
                Message::assistant("answer to first"),
                Message::user("second"),
                Message::assistant("answer to second"),
            ]
        );
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let factory = Arc::new(CountingFactory::default());
        let controller = ChatController::new(factory.clone());
        let mut session = session_with_key();

        let err = controller
            .submit(&mut session, "   ", &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::EmptyInput));
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_recoverable() {
        let factory = Arc::new(CountingFactory {
            fail: true,
            ..CountingFactory::default()
        });
        let controller = ChatController::new(factory);
        let mut session = session_with_key();

        let err = controller
            .submit(&mut session, "hello", &NoopObserver)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "upstream");
        assert!(err.to_string().contains("Unauthorized: Invalid API Key"));
        assert!(err.to_string().ends_with("try again."));
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript.last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn retry_after_supplying_credential_succeeds() {
        let controller = ChatController::new(Arc::new(CountingFactory::default()));
        let mut session = Session::new(Uuid::new_v4());

        assert!(controller
            .submit(&mut session, "hi", &NoopObserver)
            .await
            .is_err());
        session.set_credential(Credential::new("gsk_later"));
        controller
            .submit(&mut session, "hi again", &NoopObserver)
            .await
            .unwrap();

        let roles: Vec<Role> = session.transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::User, Role::Assistant]
        );
    }
}
