//! Error categories used to route failures to the right diagnostic.
//!
//! Every [`crate::Error`] belongs to exactly one category. The classifier
//! renders a message per category and the prompt loop consults the category
//! when applying its failure policy.
//!
//! | Category       | Typical source                                  |
//! |----------------|-------------------------------------------------|
//! | authentication | HTTP 401, invalid or missing API key             |
//! | connection     | DNS, TCP, TLS or timeout failures                |
//! | rate_limit     | HTTP 429                                         |
//! | status         | any other non-2xx response                       |
//! | provider       | malformed or unexpected response payloads        |
//! | unexpected     | everything else (I/O, configuration, prompting)  |
//!
//! ## Example
//!
//! ```rust
//! use agent_cli::error_category::ErrorCategory;
//!
//! let category = ErrorCategory::from_http_status(429);
//! assert_eq!(category, ErrorCategory::RateLimit);
//! assert_eq!(category.name(), "rate_limit");
//! assert!(!category.is_fatal());
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid, expired, or missing API key
    Authentication,
    /// The endpoint could not be reached
    Connection,
    /// Request rate limit exceeded
    RateLimit,
    /// Any other non-success HTTP status
    Status,
    /// The provider answered, but not with something we understand
    Provider,
    /// Error could not be classified
    Unexpected,
}

impl ErrorCategory {
    /// Returns the standard name (e.g., `"rate_limit"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Connection => "connection",
            Self::RateLimit => "rate_limit",
            Self::Status => "status",
            Self::Provider => "provider",
            Self::Unexpected => "unexpected",
        }
    }

    /// Returns whether a failure of this category is fatal for a prompt loop
    /// running with [`crate::repl::FailurePolicy::ExitOnFatal`].
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection | Self::Unexpected)
    }

    /// Maps an HTTP status code to its category.
    ///
    /// Success codes are not errors; callers only pass failing statuses here,
    /// so anything without a dedicated mapping lands in [`ErrorCategory::Status`].
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            429 => Self::RateLimit,
            _ => Self::Status,
        }
    }

    /// Maps an OpenAI-style error `type`/`code` string to a category, if it names one.
    pub fn from_provider_code(provider_code: &str) -> Option<Self> {
        let category = match provider_code {
            "invalid_api_key" | "authentication_error" | "authentication" => Self::Authentication,
            "rate_limit_exceeded" | "rate_limit_error" | "rate_limited" => Self::RateLimit,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(ErrorCategory::from_http_status(401), ErrorCategory::Authentication);
        assert_eq!(ErrorCategory::from_http_status(429), ErrorCategory::RateLimit);
        assert_eq!(ErrorCategory::from_http_status(404), ErrorCategory::Status);
        assert_eq!(ErrorCategory::from_http_status(500), ErrorCategory::Status);
    }

    #[test]
    fn provider_codes() {
        assert_eq!(
            ErrorCategory::from_provider_code("invalid_api_key"),
            Some(ErrorCategory::Authentication)
        );
        assert_eq!(
            ErrorCategory::from_provider_code("rate_limit_exceeded"),
            Some(ErrorCategory::RateLimit)
        );
        assert_eq!(ErrorCategory::from_provider_code("model_not_found"), None);
    }

    #[test]
    fn fatal_categories() {
        let fatal: Vec<_> = [
            ErrorCategory::Authentication,
            ErrorCategory::Connection,
            ErrorCategory::RateLimit,
            ErrorCategory::Status,
            ErrorCategory::Provider,
            ErrorCategory::Unexpected,
        ]
        .into_iter()
        .filter(ErrorCategory::is_fatal)
        .collect();
        assert_eq!(fatal, vec![ErrorCategory::Connection, ErrorCategory::Unexpected]);
    }
}
