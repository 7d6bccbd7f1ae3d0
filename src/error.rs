use crate::error_category::ErrorCategory;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "endpoint.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "endpoint", "output_schema")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for agent calls and their surroundings.
///
/// The first five variants are what a model endpoint can hand back; the
/// classifier matches them one by one. The remaining variants come from
/// local plumbing and are only ever reported as unexpected (unless their text
/// says otherwise, see [`crate::classifier`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        request_id: Option<String>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Rate limited: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u32>,
    },

    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        request_id: Option<String>,
        code: Option<String>,
    },

    #[error("Provider error: {raw}")]
    Provider {
        message: Option<String>,
        raw: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// A provider error whose payload could not be understood.
    pub fn provider_raw(raw: impl Into<String>) -> Self {
        Error::Provider {
            message: None,
            raw: raw.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// The category this error belongs to, based on its variant alone.
    ///
    /// Note that the classifier may still promote an `Unexpected` error to
    /// authentication after looking at its text.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Authentication { .. } => ErrorCategory::Authentication,
            Error::Connection { .. } => ErrorCategory::Connection,
            Error::RateLimit { .. } => ErrorCategory::RateLimit,
            Error::Status { .. } => ErrorCategory::Status,
            Error::Provider { .. } => ErrorCategory::Provider,
            Error::Configuration { .. }
            | Error::Validation { .. }
            | Error::Prompt(_)
            | Error::Io(_)
            | Error::Serialization(_) => ErrorCategory::Unexpected,
        }
    }

    /// Upstream request id, when the provider sent one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Authentication { request_id, .. } | Error::Status { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_display_includes_context() {
        let err = Error::configuration_with_context(
            "missing credential",
            ErrorContext::new()
                .with_field_path("OPENAI_API_KEY")
                .with_source("credential"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: missing credential (field: OPENAI_API_KEY, source: credential)"
        );
        assert_eq!(err.category(), ErrorCategory::Unexpected);
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("OPENAI_API_KEY")
        );
        assert!(Error::Prompt("closed".into()).context().is_none());
    }

    #[test]
    fn request_id_is_exposed_for_status_errors() {
        let err = Error::Status {
            status: 404,
            message: "no such model".into(),
            request_id: Some("req_1".into()),
            code: Some("model_not_found".into()),
        };
        assert_eq!(err.request_id(), Some("req_1"));
        assert_eq!(err.category(), ErrorCategory::Status);
        assert_eq!(err.to_string(), "HTTP 404: no such model");
    }
}
