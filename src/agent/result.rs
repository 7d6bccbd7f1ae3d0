use crate::types::{Message, Usage};

/// Per-call facts, for logs and for callers that want them.
#[derive(Debug, Clone, Default)]
pub struct CallStats {
    pub model: String,
    pub url: String,
    pub http_status: u16,
    pub duration_ms: u128,
    pub client_request_id: String,
    pub upstream_request_id: Option<String>,
}

/// What one agent run produced.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    /// Assistant reply text (raw JSON for structured agents).
    pub output: String,
    /// Parsed and validated reply, for agents with an output schema.
    pub structured: Option<serde_json::Value>,
    pub(crate) prompt: String,
    pub usage: Option<Usage>,
    pub stats: CallStats,
}

impl AgentRunResult {
    /// A plain-text result for `prompt`, without structured output or stats.
    pub fn new(prompt: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            structured: None,
            prompt: prompt.into(),
            usage: None,
            stats: CallStats::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Messages produced by this run: the user prompt and the assistant reply.
    ///
    /// Instructions are not included; the next agent brings its own.
    pub fn new_messages(&self) -> Vec<Message> {
        vec![
            Message::user(self.prompt.clone()),
            Message::assistant(self.output.clone()),
        ]
    }

    /// Decode the structured reply into `T`.
    pub fn structured_as<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        let value = self.structured.clone().ok_or_else(|| crate::Error::Provider {
            message: Some("Agent has no output schema".to_string()),
            raw: self.output.clone(),
        })?;
        Ok(serde_json::from_value(value)?)
    }
}
