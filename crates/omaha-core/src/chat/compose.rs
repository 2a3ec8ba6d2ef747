//! Upstream prompt composition.

use omaha_types::error::ComposeError;
use omaha_types::llm::{Message, MessageRole};

/// Build the ordered message list for one upstream call.
///
/// The persona is injected as a leading system message unless the history
/// already opens with one. System entries anywhere else in the history are
/// dropped, so the result holds at most one system message and only at the
/// head, whether or not the history was windowed.
pub fn compose(
    persona: &str,
    windowed_history: &[Message],
    question: &str,
) -> Result<Vec<Message>, ComposeError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ComposeError::EmptyQuestion);
    }

    let needs_persona = windowed_history
        .first()
        .is_none_or(|first| first.role != MessageRole::System);

    let mut messages = Vec::with_capacity(windowed_history.len() + 2);
    if needs_persona {
        messages.push(Message::system(persona));
    }
    messages.extend(
        windowed_history
            .iter()
            .enumerate()
            .filter(|(i, m)| *i == 0 || m.role != MessageRole::System)
            .map(|(_, m)| m.clone()),
    );
    messages.push(Message::user(question));

    Ok(messages)
}
