//! Chat exchange types shared by the relay server and its clients.
//!
//! `AskRequest` is the JSON body of `POST /ask`. `TranscriptEntry` is the
//! client-side record of one turn in the rendered conversation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{Message, MessageRole};

/// Opening line shown before the first exchange.
pub const GREETING: &str = "Hello! I'm Warren Buffett. Welcome to my virtual office. \
Ask me anything about investing, business, or life wisdom. What's on your mind today?";

/// Apology shown in place of an answer the relay reported as failed.
pub const UPSTREAM_APOLOGY: &str =
    "I'm sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Apology shown when the connection to the relay itself broke.
pub const TRANSPORT_APOLOGY: &str =
    "I'm sorry, I couldn't reach the server. Please check your connection and try again.";

/// Request body for `POST /ask`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The new question. Absent, null, or blank is rejected with 400.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Prior turns as the client saw them. Untrusted: system entries are dropped.
    #[serde(default)]
    pub conversation_history: Vec<Message>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>, conversation_history: Vec<Message>) -> Self {
        Self {
            question: Some(question.into()),
            conversation_history,
        }
    }
}

/// One entry of the client-side transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
}

impl TranscriptEntry {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content: content.into(),
        }
    }
}

/// Why an exchange ended without a complete answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The relay sent an `error` event.
    Upstream,
    /// Reading the response body failed.
    Transport,
    /// The body ended before any terminal event arrived.
    Interrupted,
}

impl FailureKind {
    /// Fixed user-facing text that replaces the assistant entry.
    pub fn apology(self) -> &'static str {
        match self {
            FailureKind::Upstream | FailureKind::Interrupted => UPSTREAM_APOLOGY,
            FailureKind::Transport => TRANSPORT_APOLOGY,
        }
    }
}
