//! HTTP transport for OpenAI-compatible chat endpoints.

pub(crate) mod error_classification;
pub mod http;

pub use http::{HttpTransport, ResponseMeta};
