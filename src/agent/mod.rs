//! Agents: one model endpoint plus the instructions and output shape to use with it.
//!
//! An [`Agent`] sends `instructions + history + prompt` to an OpenAI-compatible
//! chat-completions endpoint and returns an [`AgentRunResult`]. The
//! [`Runner`] trait is the seam sessions call through, so they can be driven
//! by something other than HTTP.

mod result;

pub use result::{AgentRunResult, CallStats};

use crate::credential::Credential;
use crate::provider::Endpoint;
use crate::structured::{parse_structured, JsonMode, OutputValidator};
use crate::transport::HttpTransport;
use crate::types::{Message, Usage};
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Something that can answer a prompt.
#[async_trait]
pub trait Runner: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    async fn run(
        &self,
        prompt: &str,
        history: &[Message],
        credential: Option<&Credential>,
    ) -> Result<AgentRunResult>;
}

/// Chat-completions agent.
pub struct Agent {
    endpoint: Endpoint,
    transport: Arc<HttpTransport>,
    instructions: Option<String>,
    output: Option<(JsonMode, Option<OutputValidator>)>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("endpoint", &self.endpoint)
            .field("instructions", &self.instructions)
            .field("structured", &self.output.is_some())
            .finish()
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    endpoint: Endpoint,
    transport: Option<Arc<HttpTransport>>,
    instructions: Option<String>,
    output: Option<JsonMode>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl AgentBuilder {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            transport: None,
            instructions: None,
            output: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// System instruction sent ahead of every conversation.
    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.instructions = Some(text.into());
        self
    }

    /// Require replies to follow the JSON schema of `T`.
    pub fn output_schema<T: JsonSchema>(mut self) -> Self {
        self.output = Some(JsonMode::for_type::<T>());
        self
    }

    /// Require replies to be a JSON object of any shape.
    pub fn json_mode(mut self) -> Self {
        self.output = Some(JsonMode::Json);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Share one HTTP client between agents.
    pub fn transport(mut self, transport: Arc<HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Agent> {
        self.endpoint.validate()?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };

        let output = match self.output {
            Some(mode) => {
                let validator = mode.schema().map(OutputValidator::new).transpose()?;
                Some((mode, validator))
            }
            None => None,
        };

        Ok(Agent {
            endpoint: self.endpoint,
            transport,
            instructions: self.instructions,
            output,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl Agent {
    pub fn builder(endpoint: Endpoint) -> AgentBuilder {
        AgentBuilder::new(endpoint)
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Request body for `prompt` on top of `history`.
    pub fn build_request(&self, prompt: &str, history: &[Message]) -> Value {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(text) = &self.instructions {
            messages.push(Message::system(text.clone()));
        }
        messages.extend_from_slice(history);
        messages.push(Message::user(prompt));

        let mut body = json!({
            "model": self.endpoint.model_name(),
            "messages": messages,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = self.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if let Some((mode, _)) = &self.output {
            body["response_format"] = mode.response_format();
        }
        body
    }

    fn parse_reply(&self, body: Value) -> Result<(String, Option<Usage>)> {
        let raw = body.to_string();
        let completion: ChatCompletion =
            serde_json::from_value(body).map_err(|e| Error::Provider {
                message: Some(format!("Unexpected response shape: {e}")),
                raw: raw.clone(),
            })?;

        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(Error::Provider {
                message: Some("Response contained no choices".to_string()),
                raw,
            });
        };

        match (choice.message.content, choice.message.refusal) {
            (Some(content), _) => Ok((content, completion.usage)),
            (None, Some(refusal)) => Err(Error::Provider {
                message: Some(format!("Model refused: {refusal}")),
                raw,
            }),
            (None, None) => Err(Error::Provider {
                message: Some("Response message has no content".to_string()),
                raw,
            }),
        }
    }
}

#[async_trait]
impl Runner for Agent {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn run(
        &self,
        prompt: &str,
        history: &[Message],
        credential: Option<&Credential>,
    ) -> Result<AgentRunResult> {
        let body = self.build_request(prompt, history);
        let url = self.endpoint.chat_completions_url();

        let (reply, meta) = self.transport.post_json(&url, &body, credential).await?;
        let (output, usage) = self.parse_reply(reply)?;

        let structured = match &self.output {
            Some((_, validator)) => Some(parse_structured(&output, validator.as_ref())?),
            None => None,
        };

        info!(
            model = self.endpoint.model_name(),
            history_len = history.len(),
            total_tokens = usage.map(|u| u.total_tokens).unwrap_or(0),
            "agent run complete"
        );

        Ok(AgentRunResult {
            output,
            structured,
            prompt: prompt.to_string(),
            usage,
            stats: CallStats {
                model: self.endpoint.model_name().to_string(),
                url,
                http_status: meta.http_status,
                duration_ms: meta.duration_ms,
                client_request_id: meta.client_request_id,
                upstream_request_id: meta.upstream_request_id,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::structured::ContentSummary;

    fn agent() -> AgentBuilder {
        Agent::builder(Provider::Ollama.model("gemma3:4b"))
    }

    #[test]
    fn request_orders_instructions_history_prompt() {
        let a = agent().instructions("Be brief.").temperature(0.2).build().unwrap();
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let body = a.build_request("Please continue the conversation.", &history);

        assert_eq!(body["model"], "gemma3:4b");
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(body["messages"][3]["content"], "Please continue the conversation.");
        assert_eq!(body["temperature"], 0.2);
        assert!(body.get("response_format").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn structured_agent_sends_response_format() {
        let a = agent().output_schema::<ContentSummary>().build().unwrap();
        let body = a.build_request("Rust", &[]);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn json_mode_requests_json_object() {
        let a = agent().json_mode().build().unwrap();
        let body = a.build_request("list three colors", &[]);
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
    }

    #[test]
    fn reply_without_choices_is_provider_error() {
        let a = agent().build().unwrap();
        let err = a.parse_reply(json!({"choices": []})).unwrap_err();
        assert!(matches!(err, Error::Provider { message: Some(ref m), .. } if m.contains("no choices")));
    }

    #[test]
    fn refusal_is_provider_error() {
        let a = agent().build().unwrap();
        let err = a
            .parse_reply(json!({"choices": [{"message": {"content": null, "refusal": "nope"}}]}))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn invalid_endpoint_fails_to_build() {
        let err = Agent::builder(Provider::OpenAI.model(""))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
