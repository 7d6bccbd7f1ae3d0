//! The interactive prompt loop.

use crate::error_category::ErrorCategory;
use crate::session::Session;
use crate::Result;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

pub const BANNER: &str = "Welcome to the OpenAI Agent CLI. Type 'q' to quit.";
pub const PROMPT: &str = "Your question: ";
pub const FAREWELL: &str = "Goodbye!";

/// Inputs that end the loop (compared case-insensitively after trimming).
pub const QUIT_KEYWORDS: [&str; 3] = ["q", "quit", "exit"];

pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    QUIT_KEYWORDS.iter().any(|k| input.eq_ignore_ascii_case(k))
}

/// What the loop does after a failed turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Report and keep prompting.
    #[default]
    Continue,
    /// Stop after connection and unexpected failures.
    ExitOnFatal,
    /// Stop after any failure.
    ExitOnAny,
}

impl FailurePolicy {
    pub fn should_exit(&self, category: ErrorCategory) -> bool {
        match self {
            FailurePolicy::Continue => false,
            FailurePolicy::ExitOnFatal => category.is_fatal(),
            FailurePolicy::ExitOnAny => true,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::ExitOnFatal => "exit-on-fatal",
            FailurePolicy::ExitOnAny => "exit-on-any",
        })
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "exit-on-fatal" => Ok(FailurePolicy::ExitOnFatal),
            "exit-on-any" => Ok(FailurePolicy::ExitOnAny),
            other => Err(format!("unknown failure policy '{other}'")),
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Interrupted,
    EndOfInput,
    Aborted(ErrorCategory),
}

impl LoopExit {
    pub fn exit_code(&self) -> u8 {
        match self {
            LoopExit::Aborted(_) => 1,
            _ => 0,
        }
    }
}

/// Reads prompts, hands them to a [`Session`] and prints what comes back.
#[derive(Debug, Clone)]
pub struct PromptLoop {
    banner: Option<String>,
    prompt: String,
    farewell: String,
    policy: FailurePolicy,
}

impl Default for PromptLoop {
    fn default() -> Self {
        Self {
            banner: Some(BANNER.to_string()),
            prompt: PROMPT.to_string(),
            farewell: FAREWELL.to_string(),
            policy: FailurePolicy::default(),
        }
    }
}

impl PromptLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run until quit, end of input, Ctrl-C, or a failure the policy treats as final.
    pub async fn run<I, W, S>(&self, input: I, output: &mut W, session: &mut S) -> Result<LoopExit>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
        S: Session + ?Sized,
    {
        let ctrl_c = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available; never fire.
                std::future::pending::<()>().await;
            }
        };
        self.run_until(input, output, session, ctrl_c).await
    }

    /// Like [`PromptLoop::run`], with `interrupt` standing in for Ctrl-C.
    pub async fn run_until<I, W, S, F>(
        &self,
        mut input: I,
        output: &mut W,
        session: &mut S,
        interrupt: F,
    ) -> Result<LoopExit>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
        S: Session + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        if let Some(banner) = &self.banner {
            writeln!(output, "{banner}")?;
        }

        let mut buf = Vec::new();
        loop {
            write!(output, "\n{}", self.prompt)?;
            output.flush()?;

            buf.clear();
            let read = tokio::select! {
                _ = &mut interrupt => {
                    writeln!(output, "\n{}", self.farewell)?;
                    return Ok(LoopExit::Interrupted);
                }
                read = input.read_until(b'\n', &mut buf) => read?,
            };

            if read == 0 {
                writeln!(output, "\n{}", self.farewell)?;
                info!("input closed");
                return Ok(LoopExit::EndOfInput);
            }

            // Undecodable bytes become U+FFFD instead of ending the session.
            let line = String::from_utf8_lossy(&buf);
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_quit(text) {
                writeln!(output, "{}", self.farewell)?;
                return Ok(LoopExit::Quit);
            }

            debug!(chars = text.len(), "prompt received");
            let turn = tokio::select! {
                _ = &mut interrupt => {
                    writeln!(output, "\n{}", self.farewell)?;
                    return Ok(LoopExit::Interrupted);
                }
                turn = session.respond(text) => turn,
            };

            for l in &turn.lines {
                writeln!(output, "{l}")?;
            }
            output.flush()?;

            if let Some(category) = turn.failure {
                if self.policy.should_exit(category) {
                    info!(%category, policy = %self.policy, "stopping after failed turn");
                    return Ok(LoopExit::Aborted(category));
                }
            }
        }
    }
}
