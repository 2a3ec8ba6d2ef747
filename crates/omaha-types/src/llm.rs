//! LLM request/response types for Omaha.
//!
//! These types model the data shapes for LLM provider interactions:
//! chat messages, streaming completion requests, upstream stream events,
//! and provider error handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Streaming completion request sent to an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

/// Events emitted by an upstream provider during a streaming completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The provider accepted the request and the stream is open.
    Connected,

    /// An incremental piece of generated text.
    TextDelta { text: String },

    /// The upstream stream has completed normally.
    Done,
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no upstream activity for {secs}s")]
    Timeout { secs: u64 },
}

impl LlmError {
    /// Terse diagnostic safe to hand to a client.
    ///
    /// The full `Display` output can carry provider payloads and URLs; it only
    /// ever goes to the logs.
    pub fn short_description(&self) -> &'static str {
        match self {
            LlmError::Timeout { .. } => "Upstream timed out",
            LlmError::RateLimited => "Upstream rate limited",
            LlmError::AuthenticationFailed => "Upstream authentication failed",
            LlmError::InvalidRequest(_) => "Upstream rejected the request",
            LlmError::Provider { .. } | LlmError::Deserialization(_) | LlmError::Stream(_) => {
                "Stream error"
            }
        }
    }
}
