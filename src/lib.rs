//! # agent-cli
//!
//! Interactive command-line agent for OpenAI and OpenAI-compatible chat
//! endpoints (such as a local Ollama server).
//!
//! ## Overview
//!
//! The operator types a prompt, an agent answers, and the answer is printed.
//! What the crate cares about most is what happens when a call fails: every
//! failure is classified into an [`ErrorCategory`], reported with an
//! actionable hint, and for authentication failures the operator may paste a
//! new API key which is used for a single retry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agent_cli::{Agent, PromptLoop, Provider, SingleAgentSession, TerminalPrompt};
//!
//! #[tokio::main]
//! async fn main() -> agent_cli::Result<()> {
//!     let agent = Agent::builder(Provider::Ollama.model("gemma3:4b"))
//!         .instructions("You are a helpful assistant.")
//!         .build()?;
//!     let mut session = SingleAgentSession::new(agent, None, Box::new(TerminalPrompt));
//!
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     let exit = PromptLoop::new()
//!         .run(stdin, &mut std::io::stdout(), &mut session)
//!         .await?;
//!     println!("{exit:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`repl`] | Prompt loop, quit keywords, failure policy |
//! | [`session`] | Single-agent and relay sessions, retry after a new key |
//! | [`agent`] | Chat-completions agent and the [`Runner`] seam |
//! | [`classifier`] | Error classification and message extraction |
//! | [`credential`] | API keys, keyring/env lookup, secret prompting |
//! | [`provider`] | Provider ids, default endpoints and models |
//! | [`structured`] | JSON-schema constrained output |
//! | [`transport`] | HTTP transport and response error mapping |
//! | [`types`] | Messages and token usage |

pub mod agent;
pub mod classifier;
pub mod credential;
pub mod error_category;
pub mod provider;
pub mod repl;
pub mod session;
pub mod structured;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use agent::{Agent, AgentBuilder, AgentRunResult, CallStats, Runner};
pub use classifier::{extract_error_message, ErrorClassifier, Report};
pub use credential::{Credential, CredentialSource, SecretPrompt, TerminalPrompt};
pub use error_category::ErrorCategory;
pub use provider::{Endpoint, Provider};
pub use repl::{FailurePolicy, LoopExit, PromptLoop};
pub use session::{AgentSlot, RelaySession, Session, SingleAgentSession, Turn};
pub use structured::ContentSummary;
pub use types::{Message, MessageRole, Usage};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
