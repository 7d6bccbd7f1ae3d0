//! Sessions: what happens to one line of operator input.
//!
//! A session owns its agents and their credentials. When a call fails the
//! error goes through the [`ErrorClassifier`]; if the operator supplies a new
//! key the session stores it and repeats the call once.

use crate::agent::{AgentRunResult, Runner};
use crate::classifier::{ErrorClassifier, Report};
use crate::credential::{Credential, SecretPrompt};
use crate::error_category::ErrorCategory;
use crate::types::Message;
use async_trait::async_trait;
use tracing::{info, warn};

/// Prompt the relay's second agent receives.
pub const CONTINUE_PROMPT: &str = "Please continue the conversation.";

/// Printable outcome of one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub lines: Vec<String>,
    /// Category of the error that ended the turn, if it failed.
    pub failure: Option<ErrorCategory>,
}

#[async_trait]
pub trait Session: Send {
    async fn respond(&mut self, prompt: &str) -> Turn;
}

/// Secret source shared by the sessions of one process.
pub type BoxedSecretPrompt = Box<dyn SecretPrompt + Send>;

/// Formats a successful run for display.
pub type Renderer = Box<dyn Fn(&AgentRunResult) -> String + Send + Sync>;

/// An agent, its credential, and the classifier for its provider.
pub struct AgentSlot<R> {
    runner: R,
    credential: Option<Credential>,
    classifier: ErrorClassifier,
}

struct Outcome {
    lines: Vec<String>,
    result: Result<AgentRunResult, ErrorCategory>,
}

impl<R: Runner> AgentSlot<R> {
    pub fn new(runner: R, credential: Option<Credential>) -> Self {
        let classifier = ErrorClassifier::new(runner.endpoint().provider().clone());
        Self {
            runner,
            credential,
            classifier,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn label(&self) -> &str {
        self.runner.endpoint().provider().label()
    }

    fn report(&mut self, report: Report, lines: &mut Vec<String>) -> Option<ErrorCategory> {
        lines.extend(report.lines);
        match report.replacement {
            Some(credential) => {
                self.credential = Some(credential);
                lines.push(format!("{} API key is set.", self.label()));
                None
            }
            None => Some(report.category),
        }
    }

    /// Run once; on an authentication failure with a replacement key, run once more.
    async fn run_with_recovery(
        &mut self,
        prompt: &str,
        history: &[Message],
        secrets: &mut (dyn SecretPrompt + Send),
    ) -> Outcome {
        let mut lines = Vec::new();

        let first = match self
            .runner
            .run(prompt, history, self.credential.as_ref())
            .await
        {
            Ok(result) => {
                return Outcome {
                    lines,
                    result: Ok(result),
                }
            }
            Err(e) => e,
        };

        warn!(category = %first.category(), error = %first, "agent call failed");
        let report = self.classifier.classify(&first, &mut *secrets);
        if let Some(category) = self.report(report, &mut lines) {
            return Outcome {
                lines,
                result: Err(category),
            };
        }

        info!(provider = self.label(), "retrying with replacement API key");
        match self
            .runner
            .run(prompt, history, self.credential.as_ref())
            .await
        {
            Ok(result) => Outcome {
                lines,
                result: Ok(result),
            },
            Err(second) => {
                warn!(category = %second.category(), error = %second, "retry failed");
                let report = self.classifier.classify(&second, &mut *secrets);
                let category = report.category;
                // A key entered now is kept for the next turn; no further retry.
                self.report(report, &mut lines);
                Outcome {
                    lines,
                    result: Err(category),
                }
            }
        }
    }
}

fn default_renderer() -> Renderer {
    Box::new(|r: &AgentRunResult| r.output.clone())
}

/// One agent answering every prompt.
pub struct SingleAgentSession<R> {
    slot: AgentSlot<R>,
    secrets: BoxedSecretPrompt,
    render: Renderer,
    memory: Option<Vec<Message>>,
}

impl<R: Runner> SingleAgentSession<R> {
    pub fn new(runner: R, credential: Option<Credential>, secrets: BoxedSecretPrompt) -> Self {
        Self {
            slot: AgentSlot::new(runner, credential),
            secrets,
            render: default_renderer(),
            memory: None,
        }
    }

    /// Format successful runs with `render` instead of printing the raw output.
    pub fn with_renderer(mut self, render: Renderer) -> Self {
        self.render = render;
        self
    }

    /// Carry earlier turns forward as history.
    pub fn with_memory(mut self) -> Self {
        self.memory = Some(Vec::new());
        self
    }

    pub fn slot(&self) -> &AgentSlot<R> {
        &self.slot
    }
}

#[async_trait]
impl<R: Runner> Session for SingleAgentSession<R> {
    async fn respond(&mut self, prompt: &str) -> Turn {
        let history = self.memory.clone().unwrap_or_default();
        let outcome = self
            .slot
            .run_with_recovery(prompt, &history, self.secrets.as_mut())
            .await;

        let mut lines = outcome.lines;
        match outcome.result {
            Ok(result) => {
                lines.push(format!("\n{} Agent: {}", self.slot.label(), (self.render)(&result)));
                if let Some(memory) = self.memory.as_mut() {
                    memory.extend(result.new_messages());
                }
                Turn {
                    lines,
                    failure: None,
                }
            }
            Err(category) => Turn {
                lines,
                failure: Some(category),
            },
        }
    }
}

/// Two agents: the primary answers, the secondary continues from its answer.
pub struct RelaySession<P, S> {
    primary: AgentSlot<P>,
    secondary: AgentSlot<S>,
    secrets: BoxedSecretPrompt,
    continuation: String,
}

impl<P: Runner, S: Runner> RelaySession<P, S> {
    pub fn new(primary: AgentSlot<P>, secondary: AgentSlot<S>, secrets: BoxedSecretPrompt) -> Self {
        Self {
            primary,
            secondary,
            secrets,
            continuation: CONTINUE_PROMPT.to_string(),
        }
    }

    /// Prompt the secondary agent receives instead of [`CONTINUE_PROMPT`].
    pub fn with_continuation(mut self, prompt: impl Into<String>) -> Self {
        self.continuation = prompt.into();
        self
    }

    pub fn primary(&self) -> &AgentSlot<P> {
        &self.primary
    }

    pub fn secondary(&self) -> &AgentSlot<S> {
        &self.secondary
    }
}

#[async_trait]
impl<P: Runner, S: Runner> Session for RelaySession<P, S> {
    async fn respond(&mut self, prompt: &str) -> Turn {
        let first = self
            .primary
            .run_with_recovery(prompt, &[], self.secrets.as_mut())
            .await;
        let mut lines = first.lines;
        let primary = match first.result {
            Ok(r) => r,
            Err(category) => {
                return Turn {
                    lines,
                    failure: Some(category),
                }
            }
        };
        lines.push(format!("\n{} Agent: {}", self.primary.label(), primary.output));

        let history = primary.new_messages();
        let second = self
            .secondary
            .run_with_recovery(&self.continuation, &history, self.secrets.as_mut())
            .await;
        lines.extend(second.lines);
        match second.result {
            Ok(r) => {
                lines.push(format!("\n{} Agent: {}", self.secondary.label(), r.output));
                Turn {
                    lines,
                    failure: None,
                }
            }
            Err(category) => Turn {
                lines,
                failure: Some(category),
            },
        }
    }
}
