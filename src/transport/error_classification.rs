//! Mapping of failed HTTP exchanges onto [`Error`] variants

use crate::classifier::extract_error_message;
use crate::error_category::ErrorCategory;
use crate::transport::http::{HttpTransport, REQUEST_ID_HEADERS};
use crate::Error;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
    message: Option<String>,
}

/// OpenAI nests an object under `error`; some compatible servers send a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        code: Option<serde_json::Value>,
    },
    Text(String),
}

struct ParsedBody {
    message: String,
    kind: Option<String>,
    code: Option<String>,
}

fn parse_body(status: u16, body: &str) -> ParsedBody {
    let fallback = || {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    };

    if body.trim().is_empty() {
        return ParsedBody {
            message: fallback(),
            kind: None,
            code: None,
        };
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Some(ErrorBody::Detailed {
                message,
                kind,
                code,
            }),
            ..
        }) => ParsedBody {
            message: message.filter(|m| !m.is_empty()).unwrap_or_else(fallback),
            kind,
            // Codes are usually strings but a few servers send numbers.
            code: code.and_then(|c| match c {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            }),
        },
        Ok(ErrorEnvelope {
            error: Some(ErrorBody::Text(message)),
            ..
        })
        | Ok(ErrorEnvelope {
            error: None,
            message: Some(message),
        }) => ParsedBody {
            message,
            kind: None,
            code: None,
        },
        _ => ParsedBody {
            message: extract_error_message(body.trim()),
            kind: None,
            code: None,
        },
    }
}

/// Best-effort parsing of `Retry-After` header (seconds form only).
fn retry_after_ms(headers: &HeaderMap) -> Option<u32> {
    let raw = HttpTransport::header_first(headers, &["retry-after"])?;
    let secs: u32 = raw.parse().ok()?;
    Some(secs.saturating_mul(1000))
}

/// Build the error for a non-success response.
pub(crate) fn error_from_response(status: u16, headers: &HeaderMap, body: &str) -> Error {
    let parsed = parse_body(status, body);
    let request_id = HttpTransport::header_first(headers, &REQUEST_ID_HEADERS);

    let category = match ErrorCategory::from_http_status(status) {
        ErrorCategory::Status => parsed
            .code
            .as_deref()
            .or(parsed.kind.as_deref())
            .and_then(ErrorCategory::from_provider_code)
            .unwrap_or(ErrorCategory::Status),
        other => other,
    };

    match category {
        ErrorCategory::Authentication => Error::Authentication {
            message: parsed.message,
            request_id,
        },
        ErrorCategory::RateLimit => Error::RateLimit {
            message: parsed.message,
            retry_after_ms: retry_after_ms(headers),
        },
        _ => Error::Status {
            status,
            message: parsed.message,
            request_id,
            code: parsed.code.or(parsed.kind),
        },
    }
}

/// Build the error for a request that never produced a usable response.
pub(crate) fn error_from_reqwest(e: reqwest::Error) -> Error {
    if e.is_builder() {
        return Error::configuration(format!("Invalid request: {e}"));
    }
    if e.is_decode() {
        return Error::provider_raw(e.to_string());
    }

    let mut message = if e.is_timeout() {
        "Request timed out.".to_string()
    } else {
        "Connection error.".to_string()
    };
    let mut source = std::error::Error::source(&e);
    let mut detail = e.to_string();
    while let Some(inner) = source {
        detail = inner.to_string();
        source = inner.source();
    }
    message.push(' ');
    message.push_str(&detail);
    Error::Connection { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn openai_401_is_authentication() {
        let body = r#"{"error":{"message":"Incorrect API key provided: sk-***","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = error_from_response(401, &headers(&[("x-request-id", "req_9")]), body);
        match err {
            Error::Authentication {
                message,
                request_id,
            } => {
                assert_eq!(message, "Incorrect API key provided: sk-***");
                assert_eq!(request_id.as_deref(), Some("req_9"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = error_from_response(
            429,
            &headers(&[("retry-after", "7")]),
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
        );
        assert!(matches!(
            err,
            Error::RateLimit {
                retry_after_ms: Some(7000),
                ..
            }
        ));
    }

    #[test]
    fn status_error_keeps_code_and_request_id() {
        let err = error_from_response(
            404,
            &headers(&[("request-id", "abc")]),
            r#"{"error":{"message":"The model does not exist","type":"invalid_request_error","code":"model_not_found"}}"#,
        );
        match err {
            Error::Status {
                status,
                request_id,
                code,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(request_id.as_deref(), Some("abc"));
                assert_eq!(code.as_deref(), Some("model_not_found"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn provider_code_promotes_plain_status() {
        let err = error_from_response(
            403,
            &HeaderMap::new(),
            r#"{"error":{"message":"key revoked","code":"invalid_api_key"}}"#,
        );
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[test]
    fn html_body_is_scraped() {
        let err = error_from_response(
            502,
            &HeaderMap::new(),
            "<html><head></head><body><h1>Bad Gateway</h1></body></html>",
        );
        assert!(matches!(err, Error::Status { ref message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn bare_string_error_and_empty_body() {
        let err = error_from_response(404, &HeaderMap::new(), r#"{"error":"model 'x' not found"}"#);
        assert!(matches!(err, Error::Status { ref message, .. } if message == "model 'x' not found"));

        let err = error_from_response(503, &HeaderMap::new(), "");
        assert!(matches!(err, Error::Status { ref message, .. } if message == "Service Unavailable"));
    }
}
