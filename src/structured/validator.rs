//! Output validator for structured responses.

use crate::{Error, ErrorContext, Result};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

/// Validates model replies against a compiled JSON Schema (Draft 7).
pub struct OutputValidator {
    schema: JSONSchema,
}

impl OutputValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| {
                Error::configuration_with_context(
                    "Failed to compile output schema",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("output_schema"),
                )
            })?;
        Ok(Self { schema })
    }

    /// Validate `data`, returning one message per violation.
    pub fn validate(&self, data: &Value) -> std::result::Result<(), Vec<String>> {
        self.schema.validate(data).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect()
        })
    }
}

impl std::fmt::Debug for OutputValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> OutputValidator {
        OutputValidator::new(&json!({
            "type": "object",
            "properties": {"title": {"type": "string"}},
            "required": ["title"]
        }))
        .unwrap()
    }

    #[test]
    fn accepts_matching_data() {
        assert!(validator().validate(&json!({"title": "x"})).is_ok());
    }

    #[test]
    fn reports_missing_fields() {
        let errors = validator().validate(&json!({})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("title"));
    }

    #[test]
    fn reports_paths_for_nested_violations() {
        let errors = validator().validate(&json!({"title": 3})).unwrap_err();
        assert!(errors[0].starts_with("/title"));
    }

    #[test]
    fn invalid_schema_is_configuration_error() {
        let err = OutputValidator::new(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
