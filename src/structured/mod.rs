//! Structured output: ask a model for JSON matching a schema and check what comes back.
//!
//! # Examples
//!
//! ```
//! use agent_cli::structured::{parse_structured, ContentSummary, JsonMode, OutputValidator};
//!
//! let mode = JsonMode::for_type::<ContentSummary>();
//! let validator = OutputValidator::new(mode.schema().unwrap()).unwrap();
//! let value = parse_structured(r#"{"title": "Rust", "summary": "A language."}"#, Some(&validator)).unwrap();
//! let summary: ContentSummary = serde_json::from_value(value).unwrap();
//! assert_eq!(summary.title, "Rust");
//! ```

pub mod json_mode;
pub mod validator;

pub use json_mode::{parse_structured, JsonMode};
pub use validator::OutputValidator;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title and short summary of whatever the operator asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContentSummary {
    pub title: String,
    pub summary: String,
}

impl fmt::Display for ContentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "title={:?} summary={:?}", self.title, self.summary)
    }
}
