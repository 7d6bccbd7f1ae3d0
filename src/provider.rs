use crate::{Error, ErrorContext, Result};

/// Built-in OpenAI base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Ollama's OpenAI-compatible endpoint on its default port.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Provider identifier.
///
/// Everything speaks the OpenAI chat-completions dialect; the provider only
/// decides defaults (base URL, credential variable, default model, label).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Ollama,
    /// Any other OpenAI-compatible server.
    Custom { id: String, base_url: String },
}

impl Provider {
    /// Resolve a provider from its id. Unknown ids need an explicit base URL.
    pub fn from_id(id: &str, base_url: Option<&str>) -> Result<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "ollama" => Ok(Provider::Ollama),
            other => match base_url {
                Some(url) => Ok(Provider::Custom {
                    id: other.to_string(),
                    base_url: url.to_string(),
                }),
                None => Err(Error::configuration_with_context(
                    format!("Unknown provider '{other}' requires a base URL"),
                    ErrorContext::new()
                        .with_field_path("base_url")
                        .with_source("provider"),
                )),
            },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Ollama => "ollama",
            Provider::Custom { id, .. } => id.as_str(),
        }
    }

    /// Human-facing name used in prompts and answer prefixes.
    pub fn label(&self) -> &str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Ollama => "Ollama",
            Provider::Custom { id, .. } => id.as_str(),
        }
    }

    pub fn default_base_url(&self) -> &str {
        match self {
            Provider::OpenAI => OPENAI_BASE_URL,
            Provider::Ollama => OLLAMA_BASE_URL,
            Provider::Custom { base_url, .. } => base_url.as_str(),
        }
    }

    /// Environment variable holding this provider's API key.
    ///
    /// Ollama runs locally without authentication and has none.
    pub fn credential_env_var(&self) -> Option<String> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY".to_string()),
            Provider::Ollama => None,
            Provider::Custom { id, .. } => {
                Some(format!("{}_API_KEY", id.replace('-', "_").to_uppercase()))
            }
        }
    }

    /// Whether calls are pointless without a credential (we prompt at startup).
    pub fn requires_credential(&self) -> bool {
        matches!(self, Provider::OpenAI)
    }

    /// Default model name for this provider (best-effort).
    ///
    /// Precedence:
    /// 1) `AGENT_DEFAULT_MODEL_<PROVIDER_ID_UPPER>`
    /// 2) a built-in default for the known providers
    pub fn default_model_name(&self) -> Option<String> {
        let key = format!(
            "AGENT_DEFAULT_MODEL_{}",
            self.id().replace('-', "_").to_uppercase()
        );
        if let Ok(v) = std::env::var(key) {
            let v = v.trim().to_string();
            if !v.is_empty() {
                return Some(v);
            }
        }

        match self {
            Provider::OpenAI => Some("gpt-4.1-nano-2025-04-14".to_string()),
            Provider::Ollama => Some("llama3.2:3b".to_string()),
            Provider::Custom { .. } => None,
        }
    }

    /// Construct an endpoint for a model served by this provider.
    pub fn model(&self, model: impl Into<String>) -> Endpoint {
        Endpoint::new(self.clone(), model)
    }

    /// Endpoint for the provider's default model.
    pub fn default_endpoint(&self) -> Result<Endpoint> {
        let Some(model) = self.default_model_name() else {
            return Err(Error::configuration(format!(
                "No default model for provider '{}'. Pass --model, or set AGENT_DEFAULT_MODEL_{}",
                self.id(),
                self.id().replace('-', "_").to_uppercase()
            )));
        };
        Ok(self.model(model))
    }
}

/// A provider + model pair, optionally pinned to a non-default base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    provider: Provider,
    model: String,
    base_url: Option<String>,
}

impl Endpoint {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Override the base URL (proxies, remote Ollama hosts, mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Effective base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url())
    }

    /// Reject endpoints that could never be called.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation_with_context(
                "Model name must be non-empty",
                ErrorContext::new()
                    .with_field_path("endpoint.model")
                    .with_source("endpoint"),
            ));
        }
        let parsed = url::Url::parse(self.base_url()).map_err(|e| {
            Error::validation_with_context(
                "Invalid base URL",
                ErrorContext::new()
                    .with_field_path("endpoint.base_url")
                    .with_details(format!("{}: {}", self.base_url(), e))
                    .with_source("endpoint"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::validation_with_context(
                "Base URL must use http or https",
                ErrorContext::new()
                    .with_field_path("endpoint.base_url")
                    .with_details(parsed.scheme().to_string())
                    .with_source("endpoint"),
            ));
        }
        Ok(())
    }

    pub fn as_str(&self) -> String {
        format!("{}/{}", self.provider.id(), self.model)
    }
}
