//! Shared fixtures for integration tests

#![allow(dead_code)]

use agent_cli::agent::Runner;
use agent_cli::{AgentRunResult, Credential, Endpoint, Error, Message, Provider, SecretPrompt};
use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/v1", server.url());
        Self { server, base_url }
    }

    /// Endpoint on the mock server for `provider`
    pub fn endpoint(&self, provider: Provider, model: &str) -> Endpoint {
        provider.model(model).with_base_url(self.base_url.clone())
    }

    /// A successful chat completion whose assistant reply is `content`
    pub async fn mock_reply(&mut self, content: &str) -> Mock {
        let body = serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
        });
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-request-id", "req-ok")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// An error response with the given status and body
    pub async fn mock_error_response(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_header("x-request-id", "abc")
            .with_body(body)
            .create_async()
            .await
    }
}

/// Secret prompt that replays scripted answers and records every label it showed.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<String>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().map(Into::into).collect())),
            asked: Arc::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl SecretPrompt for ScriptedPrompt {
    fn prompt_secret(&mut self, label: &str) -> agent_cli::Result<String> {
        self.asked.lock().unwrap().push(label.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// One recorded call to a [`StubRunner`].
#[derive(Debug, Clone)]
pub struct Call {
    pub prompt: String,
    pub history: Vec<Message>,
    pub credential: Option<String>,
}

/// Runner that answers from a script instead of the network.
#[derive(Clone)]
pub struct StubRunner {
    endpoint: Endpoint,
    replies: Arc<Mutex<VecDeque<agent_cli::Result<String>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl StubRunner {
    pub fn new(provider: Provider, replies: Vec<agent_cli::Result<String>>) -> Self {
        Self {
            endpoint: provider.model("stub-model"),
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Runner for StubRunner {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn run(
        &self,
        prompt: &str,
        history: &[Message],
        credential: Option<&Credential>,
    ) -> agent_cli::Result<AgentRunResult> {
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            history: history.to_vec(),
            credential: credential.map(|c| c.expose().to_string()),
        });
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("(no more replies)".to_string()));
        next.map(|output| AgentRunResult::new(prompt, output))
    }
}

pub fn auth_error() -> Error {
    Error::Authentication {
        message: "Incorrect API key provided: sk-old".to_string(),
        request_id: None,
    }
}

pub fn connection_error() -> Error {
    Error::Connection {
        message: "Connection error.".to_string(),
    }
}
