//! History windowing.

use omaha_types::llm::{Message, MessageRole};

/// Default number of history entries forwarded upstream.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Drop every system entry, then keep the trailing `max` entries.
///
/// Client-supplied system messages are never trusted; the persona is the only
/// system text that reaches the provider.
pub fn window(history: &[Message], max: usize) -> Vec<Message> {
    let kept: Vec<&Message> = history
        .iter()
        .filter(|msg| msg.role != MessageRole::System)
        .collect();
    let skip = kept.len().saturating_sub(max);
    kept.into_iter().skip(skip).cloned().collect()
}
