//! Error classifier: turns a failed call into an operator-facing report.
//!
//! Dispatch follows the variants of [`Error`] in a fixed order:
//!
//! 1. authentication, which also asks the operator for a replacement key
//! 2. connection
//! 3. rate limit
//! 4. other HTTP status (with request id and provider code when known)
//! 5. provider errors (message attribute, or scraped from the raw payload)
//! 6. anything else, which is scraped and re-checked for API-key wording
//!    before being reported as unexpected
//!
//! The classifier never fails. It prints nothing itself; the caller renders
//! [`Report::lines`].

mod extract;

pub use extract::extract_error_message;

use crate::credential::{prompt_label, Credential, SecretPrompt};
use crate::error_category::ErrorCategory;
use crate::provider::Provider;
use crate::Error;
use tracing::warn;

pub const AUTHENTICATION_HINT: &str = "Please check your API key and make sure it's valid.";
pub const CONNECTION_HINT: &str =
    "Check your network settings, proxy configuration, or firewall rules.";
pub const RATE_LIMIT_HINT: &str = "You've hit the rate limit. Please wait before trying again.";

/// Substrings that reveal a credential problem in otherwise unclassified errors.
const API_KEY_MARKERS: [&str; 2] = ["Incorrect API key provided", "API key"];

/// Outcome of classifying one error.
#[derive(Debug, Clone)]
pub struct Report {
    pub category: ErrorCategory,
    pub lines: Vec<String>,
    /// New credential supplied by the operator (authentication failures only).
    pub replacement: Option<Credential>,
}

impl Report {
    fn new(category: ErrorCategory, lines: Vec<String>) -> Self {
        Self {
            category,
            lines,
            replacement: None,
        }
    }

    /// The report as one multi-line message.
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }
}

/// Classifier bound to the provider whose key it may ask for.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    provider: Provider,
}

impl ErrorClassifier {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Classify `error`, soliciting a replacement credential from `secrets`
    /// exactly once when (and only when) it is an authentication failure.
    pub fn classify(&self, error: &Error, secrets: &mut dyn SecretPrompt) -> Report {
        match error {
            Error::Authentication { message, .. } => self.authentication(message, secrets),
            Error::Connection { message } => Report::new(
                ErrorCategory::Connection,
                vec![format!("Connection Error: {message}"), CONNECTION_HINT.to_string()],
            ),
            Error::RateLimit { message, .. } => Report::new(
                ErrorCategory::RateLimit,
                vec![format!("Rate Limit Error: {message}"), RATE_LIMIT_HINT.to_string()],
            ),
            Error::Status {
                status,
                message,
                request_id,
                code,
            } => {
                let mut lines = vec![format!("API Status Error ({status}): {message}")];
                if let Some(id) = request_id.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(format!("Request ID: {id}"));
                }
                if let Some(code) = code.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(format!("Error code: {code}"));
                }
                Report::new(ErrorCategory::Status, lines)
            }
            Error::Provider { message, raw } => {
                let text = match message {
                    Some(m) => m.clone(),
                    None => extract_error_message(raw),
                };
                Report::new(ErrorCategory::Provider, vec![format!("Provider Error: {text}")])
            }
            Error::Configuration { .. }
            | Error::Validation { .. }
            | Error::Prompt(_)
            | Error::Io(_)
            | Error::Serialization(_) => {
                let text = extract_error_message(&error.to_string());
                if API_KEY_MARKERS.iter().any(|m| text.contains(m)) {
                    self.authentication(&text, secrets)
                } else {
                    Report::new(
                        ErrorCategory::Unexpected,
                        vec![format!("Unexpected error: {text}")],
                    )
                }
            }
        }
    }

    fn authentication(&self, message: &str, secrets: &mut dyn SecretPrompt) -> Report {
        let mut report = Report::new(
            ErrorCategory::Authentication,
            vec![
                format!("Authentication Error: {message}"),
                AUTHENTICATION_HINT.to_string(),
            ],
        );
        match secrets.prompt_secret(&prompt_label(&self.provider, true)) {
            Ok(secret) => report.replacement = Credential::new(secret),
            Err(e) => warn!(error = %e, "could not read a replacement API key"),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorContext;

    #[derive(Default)]
    struct CountingPrompt {
        answers: Vec<String>,
        asked: Vec<String>,
    }

    impl SecretPrompt for CountingPrompt {
        fn prompt_secret(&mut self, label: &str) -> crate::Result<String> {
            self.asked.push(label.to_string());
            Ok(self.answers.pop().unwrap_or_default())
        }
    }

    struct FailingPrompt;

    impl SecretPrompt for FailingPrompt {
        fn prompt_secret(&mut self, _label: &str) -> crate::Result<String> {
            Err(Error::Prompt("not a terminal".into()))
        }
    }

    fn classifier() -> ErrorClassifier {
        ErrorClassifier::new(Provider::OpenAI)
    }

    #[test]
    fn provider_error_prefers_message_attribute() {
        let err = Error::Provider {
            message: Some("model overloaded".into()),
            raw: "{'message': 'ignored', 'type': 'x'}".into(),
        };
        let report = classifier().classify(&err, &mut CountingPrompt::default());
        assert_eq!(report.category, ErrorCategory::Provider);
        assert_eq!(report.message(), "Provider Error: model overloaded");
    }

    #[test]
    fn provider_error_scrapes_raw_payload() {
        let err = Error::provider_raw("<html><h1>502 Bad Gateway</h1></html>");
        let report = classifier().classify(&err, &mut CountingPrompt::default());
        assert_eq!(report.message(), "Provider Error: 502 Bad Gateway");
    }

    #[test]
    fn unrecognized_error_with_key_wording_is_authentication() {
        let err = Error::configuration_with_context(
            "no API key configured",
            ErrorContext::new().with_source("credential"),
        );
        let mut prompt = CountingPrompt {
            answers: vec!["sk-new".into()],
            ..Default::default()
        };
        let report = classifier().classify(&err, &mut prompt);
        assert_eq!(report.category, ErrorCategory::Authentication);
        assert!(report.lines[0].starts_with("Authentication Error: "));
        assert_eq!(report.replacement.unwrap().expose(), "sk-new");
        assert_eq!(prompt.asked, vec!["Enter a new OpenAI API Key".to_string()]);
    }

    #[test]
    fn unrecognized_error_is_unexpected() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        let mut prompt = CountingPrompt::default();
        let report = classifier().classify(&err, &mut prompt);
        assert_eq!(report.category, ErrorCategory::Unexpected);
        assert_eq!(report.message(), "Unexpected error: I/O error: disk on fire");
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn failed_prompt_yields_no_replacement() {
        let err = Error::Authentication {
            message: "Incorrect API key provided".into(),
            request_id: None,
        };
        let report = classifier().classify(&err, &mut FailingPrompt);
        assert_eq!(report.category, ErrorCategory::Authentication);
        assert!(report.replacement.is_none());
    }

    #[test]
    fn blank_replacement_is_discarded() {
        let err = Error::Authentication {
            message: "expired".into(),
            request_id: None,
        };
        let mut prompt = CountingPrompt {
            answers: vec!["   ".into()],
            ..Default::default()
        };
        let report = classifier().classify(&err, &mut prompt);
        assert!(report.replacement.is_none());
        assert_eq!(prompt.asked.len(), 1);
    }

    #[test]
    fn status_error_omits_absent_details() {
        let err = Error::Status {
            status: 500,
            message: "boom".into(),
            request_id: None,
            code: None,
        };
        let report = classifier().classify(&err, &mut CountingPrompt::default());
        assert_eq!(report.lines, vec!["API Status Error (500): boom".to_string()]);
    }
}
