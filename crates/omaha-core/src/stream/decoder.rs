//! Byte chunks to relay events.

use omaha_types::event::{EVENT_PREFIX, RelayEvent};

use super::lines::LineBuffer;
use super::utf8::Utf8Decoder;

/// Parse one complete line.
///
/// Returns `Ok(None)` for lines that are not event lines (blank separators,
/// comments, anything without the `data: ` prefix).
pub fn parse_line(line: &str) -> Result<Option<RelayEvent>, serde_json::Error> {
    match line.strip_prefix(EVENT_PREFIX) {
        Some(payload) => serde_json::from_str(payload).map(Some),
        None => Ok(None),
    }
}

/// Incremental decoder from response body chunks to [`RelayEvent`]s.
///
/// Holds the two pieces of state that survive between chunks: a partial
/// UTF-8 sequence and a partial line.
#[derive(Debug, Default)]
pub struct EventDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
    malformed: usize,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RelayEvent> {
        let text = self.utf8.decode(chunk);
        let lines = self.lines.push(&text);
        self.parse_all(lines)
    }

    /// Flush held-back state at end of input.
    pub fn finish(&mut self) -> Vec<RelayEvent> {
        let tail = self.utf8.finish();
        let mut lines = self.lines.push(&tail);
        lines.extend(self.lines.finish());
        self.parse_all(lines)
    }

    /// Number of prefixed lines skipped because they failed to parse.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn parse_all(&mut self, lines: Vec<String>) -> Vec<RelayEvent> {
        let mut events = Vec::new();
        for line in lines {
            match parse_line(&line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    self.malformed += 1;
                    tracing::warn!(error = %err, line = %line, "Skipping malformed event line");
                }
            }
        }
        events
    }
}
