//! JSON mode support for structured output.
//!
//! Builds the OpenAI `response_format` request field and turns the model's
//! text back into JSON. Ollama's OpenAI-compatible endpoint accepts the same
//! field.

use crate::structured::validator::OutputValidator;
use crate::{Error, Result};
use regex::Regex;
use schemars::JsonSchema;
use serde_json::{json, Value};

/// Level of JSON structure enforcement requested from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonMode {
    /// Any valid JSON object
    Json,

    /// JSON that must follow `schema`
    JsonSchema {
        name: String,
        schema: Value,
        strict: bool,
    },
}

impl JsonMode {
    /// Schema mode for a Rust type.
    ///
    /// ```
    /// use agent_cli::structured::{ContentSummary, JsonMode};
    ///
    /// let mode = JsonMode::for_type::<ContentSummary>();
    /// let format = mode.response_format();
    /// assert_eq!(format["type"], "json_schema");
    /// assert_eq!(format["json_schema"]["name"], "ContentSummary");
    /// ```
    pub fn for_type<T: JsonSchema>() -> Self {
        let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({}));
        if let Some(obj) = schema.as_object_mut() {
            // Metadata keys some OpenAI-compatible servers reject in strict mode.
            obj.remove("$schema");
            obj.remove("title");
        }
        Self::JsonSchema {
            name: T::schema_name(),
            schema,
            strict: true,
        }
    }

    /// Value for the `response_format` field of a chat-completions request.
    pub fn response_format(&self) -> Value {
        match self {
            JsonMode::Json => json!({ "type": "json_object" }),
            JsonMode::JsonSchema {
                name,
                schema,
                strict,
            } => json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "strict": strict,
                    "schema": schema
                }
            }),
        }
    }

    pub fn schema(&self) -> Option<&Value> {
        match self {
            JsonMode::Json => None,
            JsonMode::JsonSchema { schema, .. } => Some(schema),
        }
    }
}

/// Parse the model's reply as JSON and, when a validator is given, check it.
///
/// Failures become [`Error::Provider`] carrying the raw reply, since the
/// provider did answer, just not with what was asked for.
pub fn parse_structured(content: &str, validator: Option<&OutputValidator>) -> Result<Value> {
    let parsed = parse_json(content.trim()).ok_or_else(|| Error::Provider {
        message: Some("Model reply is not valid JSON".to_string()),
        raw: content.to_string(),
    })?;

    if let Some(validator) = validator {
        if let Err(errors) = validator.validate(&parsed) {
            return Err(Error::Provider {
                message: Some(format!(
                    "Model reply does not match the output schema: {}",
                    errors.join("; ")
                )),
                raw: content.to_string(),
            });
        }
    }

    Ok(parsed)
}

/// Parse JSON from text, with support for markdown code blocks.
fn parse_json(text: &str) -> Option<Value> {
    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
        return Some(parsed);
    }

    let patterns = [
        r"```json\s*([\s\S]*?)\s*```",
        r"```\s*([\s\S]*?)\s*```",
        r"\{[\s\S]*\}",
    ];

    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(text) {
                let candidate = match captures.get(1) {
                    Some(inner) => inner.as_str(),
                    None => captures.get(0).map(|c| c.as_str()).unwrap_or(text),
                };

                if let Ok(parsed) = serde_json::from_str::<Value>(candidate.trim()) {
                    return Some(parsed);
                }
            }
        }
    }

    None
}
