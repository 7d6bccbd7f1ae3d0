//! agent-cli: interactive chat with OpenAI and OpenAI-compatible endpoints.
//!
//! Usage:
//!   agent-cli chat                       One agent (OpenAI by default)
//!   agent-cli relay                      OpenAI answers, Ollama continues
//!   agent-cli summarize                  Title + summary from a local model
//!
//! Logs go to stderr and are controlled by `RUST_LOG` (default `warn`).

use agent_cli::credential::{self, CredentialSource};
use agent_cli::session::{BoxedSecretPrompt, Renderer};
use agent_cli::structured::ContentSummary;
use agent_cli::transport::HttpTransport;
use agent_cli::{
    Agent, AgentRunResult, AgentSlot, Credential, Endpoint, FailurePolicy, PromptLoop, Provider,
    RelaySession, Session, SingleAgentSession, TerminalPrompt,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SUMMARY_INSTRUCTIONS: &str =
    "You are a helpful assistant. Summarize the content and return the title and summary.";
const SUMMARY_PROMPT: &str = "Ask any question (type 'q' to quit): ";
const RELAY_BANNER: &str = "Welcome to the Multi-Model Agent CLI. Type 'q' to quit.";

#[derive(Parser)]
#[command(name = "agent-cli")]
#[command(about = "Interactive agent for OpenAI and OpenAI-compatible endpoints", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// What to do after a failed turn
    #[arg(long, value_enum, global = true, env = "AGENT_ON_FAILURE", default_value_t = FailurePolicy::Continue)]
    on_failure: FailurePolicy,

    /// Do not look for API keys in the OS keyring
    #[arg(long, global = true)]
    no_keyring: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a single agent
    Chat {
        #[command(flatten)]
        target: Target,

        /// System instructions for the agent
        #[arg(long)]
        instructions: Option<String>,

        /// Send earlier turns along with each prompt
        #[arg(long)]
        memory: bool,
    },

    /// One agent answers, a second continues the conversation
    Relay {
        /// Provider of the answering agent
        #[arg(long, default_value = "openai")]
        primary: String,

        /// Model of the answering agent
        #[arg(long)]
        primary_model: Option<String>,

        /// Base URL for a custom primary provider
        #[arg(long)]
        primary_base_url: Option<String>,

        /// Provider of the continuing agent
        #[arg(long, default_value = "ollama")]
        secondary: String,

        /// Model of the continuing agent
        #[arg(long, default_value = "gemma3:4b")]
        secondary_model: String,

        /// Base URL for a custom secondary provider
        #[arg(long)]
        secondary_base_url: Option<String>,
    },

    /// Summarize each prompt into a title and summary
    Summarize {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args, Clone)]
struct Target {
    /// Provider id: openai, ollama, or a custom id used with --base-url
    #[arg(long, env = "AGENT_PROVIDER")]
    provider: Option<String>,

    /// Model name (defaults to the provider's default model)
    #[arg(long, env = "AGENT_MODEL")]
    model: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long, env = "AGENT_BASE_URL")]
    base_url: Option<String>,
}

impl Target {
    fn endpoint(&self, default_provider: &str) -> agent_cli::Result<Endpoint> {
        let id = self.provider.as_deref().unwrap_or(default_provider);
        endpoint_for(id, self.model.as_deref(), self.base_url.as_deref())
    }
}

fn endpoint_for(
    provider: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> agent_cli::Result<Endpoint> {
    let provider = Provider::from_id(provider, base_url)?;
    let endpoint = match model {
        Some(m) => provider.model(m),
        None => provider.default_endpoint()?,
    };
    Ok(match base_url {
        Some(url) => endpoint.with_base_url(url),
        None => endpoint,
    })
}

/// Find the key for `endpoint`'s provider, asking on the terminal if it needs one.
fn credential_for(
    endpoint: &Endpoint,
    use_keyring: bool,
    secrets: &mut BoxedSecretPrompt,
) -> anyhow::Result<Option<Credential>> {
    let provider = endpoint.provider();
    let resolved = credential::resolve(provider, use_keyring, secrets.as_mut())
        .with_context(|| format!("reading {} API key", provider.label()))?;
    Ok(match resolved {
        Some((c, source)) => {
            info!(provider = provider.id(), ?source, "API key found");
            if source == CredentialSource::Prompt {
                println!("{} API key is set.", provider.label());
            }
            Some(c)
        }
        None => {
            if provider.requires_credential() {
                warn!(provider = provider.id(), "no API key; first request will fail");
            }
            None
        }
    })
}

fn summary_renderer() -> Renderer {
    Box::new(|r: &AgentRunResult| match r.structured_as::<ContentSummary>() {
        Ok(summary) => summary.to_string(),
        Err(_) => r.output.clone(),
    })
}

/// Banner and prompt for each subcommand.
fn prompt_loop_for(cli: &Cli) -> PromptLoop {
    let repl = PromptLoop::new().with_policy(cli.on_failure);
    match &cli.command {
        Commands::Chat { .. } => repl,
        Commands::Relay { .. } => repl.with_banner(Some(RELAY_BANNER.to_string())),
        Commands::Summarize { .. } => repl.with_banner(None).with_prompt(SUMMARY_PROMPT),
    }
}

fn build_session(cli: &Cli) -> anyhow::Result<Box<dyn Session>> {
    let use_keyring = !cli.no_keyring;
    let transport = Arc::new(HttpTransport::new()?);
    let mut secrets: BoxedSecretPrompt = Box::new(TerminalPrompt);

    match &cli.command {
        Commands::Chat {
            target,
            instructions,
            memory,
        } => {
            let endpoint = target.endpoint("openai")?;
            let credential = credential_for(&endpoint, use_keyring, &mut secrets)?;
            let mut builder = Agent::builder(endpoint).transport(transport);
            if let Some(text) = instructions {
                builder = builder.instructions(text.clone());
            }
            let mut session = SingleAgentSession::new(builder.build()?, credential, secrets);
            if *memory {
                session = session.with_memory();
            }
            Ok(Box::new(session))
        }
        Commands::Relay {
            primary,
            primary_model,
            primary_base_url,
            secondary,
            secondary_model,
            secondary_base_url,
        } => {
            let first = endpoint_for(
                primary,
                primary_model.as_deref(),
                primary_base_url.as_deref(),
            )?;
            let second = endpoint_for(
                secondary,
                Some(secondary_model.as_str()),
                secondary_base_url.as_deref(),
            )?;
            let first_key = credential_for(&first, use_keyring, &mut secrets)?;
            let second_key = credential_for(&second, use_keyring, &mut secrets)?;

            let first = Agent::builder(first).transport(transport.clone()).build()?;
            let second = Agent::builder(second).transport(transport).build()?;
            let session = RelaySession::new(
                AgentSlot::new(first, first_key),
                AgentSlot::new(second, second_key),
                secrets,
            );
            Ok(Box::new(session))
        }
        Commands::Summarize { target } => {
            let endpoint = target.endpoint("ollama")?;
            let credential = credential_for(&endpoint, use_keyring, &mut secrets)?;
            let agent = Agent::builder(endpoint)
                .transport(transport)
                .instructions(SUMMARY_INSTRUCTIONS)
                .output_schema::<ContentSummary>()
                .build()?;
            let session = SingleAgentSession::new(agent, credential, secrets)
                .with_renderer(summary_renderer());
            Ok(Box::new(session))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let repl = prompt_loop_for(&cli);
    let mut session = build_session(&cli)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let exit = repl.run(stdin, &mut stdout, session.as_mut()).await?;

    info!(?exit, "prompt loop finished");
    Ok(ExitCode::from(exit.exit_code()))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
