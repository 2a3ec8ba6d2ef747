//! Relay events and their line-delimited wire encoding.
//!
//! Every event travels as one line `data: <json>` followed by a blank line.
//! The JSON object carries exactly one of three keys:
//!
//! ```text
//! data: {"content":"Value "}
//!
//! data: {"done":true}
//!
//! data: {"error":"Stream error"}
//! ```

use serde::{Deserialize, Serialize};

/// Prefix that marks an event line on the wire.
pub const EVENT_PREFIX: &str = "data: ";

/// One event of a relayed exchange.
///
/// `Done` and `Error` are terminal: nothing follows them for the same exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub enum RelayEvent {
    /// An incremental text delta, passed through exactly as received upstream.
    Content(String),
    /// The exchange completed normally.
    Done,
    /// The exchange failed; carries a short, client-safe description.
    Error(String),
}

impl RelayEvent {
    /// Encode as a complete wire frame, including the trailing blank line.
    pub fn to_wire(&self) -> String {
        let json = serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"Stream error"}"#.to_string());
        format!("{EVENT_PREFIX}{json}\n\n")
    }
}

/// Flat JSON shape used for (de)serialization.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TryFrom<WireEvent> for RelayEvent {
    type Error = String;

    fn try_from(wire: WireEvent) -> Result<Self, String> {
        match (wire.content, wire.done, wire.error) {
            (Some(content), None, None) => Ok(RelayEvent::Content(content)),
            (None, Some(true), None) => Ok(RelayEvent::Done),
            (None, None, Some(error)) => Ok(RelayEvent::Error(error)),
            _ => Err("event must carry exactly one of content, done=true, error".to_string()),
        }
    }
}

impl From<RelayEvent> for WireEvent {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::Content(content) => WireEvent {
                content: Some(content),
                ..Default::default()
            },
            RelayEvent::Done => WireEvent {
                done: Some(true),
                ..Default::default()
            },
            RelayEvent::Error(error) => WireEvent {
                error: Some(error),
                ..Default::default()
            },
        }
    }
}
