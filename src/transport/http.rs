use crate::credential::Credential;
use crate::transport::error_classification::{error_from_reqwest, error_from_response};
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::env;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Header names providers use for their own request ids, in preference order.
pub(crate) const REQUEST_ID_HEADERS: [&str; 4] =
    ["x-request-id", "request-id", "x-amzn-requestid", "cf-ray"];

/// Facts about a successful exchange.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub http_status: u16,
    pub client_request_id: String,
    pub upstream_request_id: Option<String>,
    pub duration_ms: u128,
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("AGENT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(60);
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(concat!("agent-cli/", env!("CARGO_PKG_VERSION")));

        if let Ok(proxy_url) = env::var("AGENT_PROXY_URL") {
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                Error::configuration(format!("Invalid AGENT_PROXY_URL '{proxy_url}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub(crate) fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
        for name in names {
            if let Some(v) = headers.get(*name) {
                if let Ok(s) = v.to_str() {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }

    /// POST a JSON body and return the decoded JSON reply.
    ///
    /// Non-2xx replies and transport failures come back as typed errors
    /// (authentication, rate limit, status, connection).
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: Option<&Credential>,
    ) -> Result<(serde_json::Value, ResponseMeta)> {
        let client_request_id = Uuid::new_v4().to_string();

        let mut req = self
            .client
            .post(url)
            .json(body)
            // Our own correlation id. Providers may ignore it.
            .header("x-agent-cli-request-id", &client_request_id);
        if let Some(credential) = credential {
            req = req.bearer_auth(credential.expose());
        }

        debug!(url, client_request_id = client_request_id.as_str(), "sending request");
        let start = Instant::now();
        let resp = req.send().await.map_err(error_from_reqwest)?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let upstream_request_id = Self::header_first(&headers, &REQUEST_ID_HEADERS);
        let text = resp.text().await.map_err(error_from_reqwest)?;

        info!(
            http_status = status,
            request_id = upstream_request_id.as_deref().unwrap_or(""),
            client_request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis(),
            "chat request finished"
        );

        if !(200..300).contains(&status) {
            return Err(error_from_response(status, &headers, &text));
        }

        let json = serde_json::from_str(&text).map_err(|e| Error::Provider {
            message: Some(format!("Response body is not valid JSON: {e}")),
            raw: text.clone(),
        })?;

        Ok((
            json,
            ResponseMeta {
                http_status: status,
                client_request_id,
                upstream_request_id,
                duration_ms: start.elapsed().as_millis(),
            },
        ))
    }
}
