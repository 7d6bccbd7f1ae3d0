//! Core data types shared by agents and sessions.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and content |
//! | [`MessageRole`] | Message role (system, user, assistant) |
//! | [`Usage`] | Token accounting reported by the provider |

pub mod message;

pub use message::{Message, MessageRole};

use serde::{Deserialize, Serialize};

/// Token usage as reported in a chat-completions response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}
