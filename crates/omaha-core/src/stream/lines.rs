//! Line splitting with carry-over between chunks.

/// Accumulates decoded text and hands out complete lines.
///
/// The trailing segment after the last newline may be an incomplete line;
/// it is carried over and prefixed to the next push.
#[derive(Debug, Default)]
pub struct LineBuffer {
    carry: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return every line it completed, without terminators.
    ///
    /// Both `\n` and `\r\n` end a line.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.carry.push_str(text);
        let Some(last_newline) = self.carry.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        complete[..last_newline]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Take the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.carry))
        }
    }

    #[cfg(test)]
    fn carry(&self) -> &str {
        &self.carry
    }
}
