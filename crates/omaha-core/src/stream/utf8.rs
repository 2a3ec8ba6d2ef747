//! Incremental UTF-8 decoding across chunk boundaries.

/// Stateful decoder that carries an incomplete multi-byte sequence from one
/// chunk into the next.
///
/// Invalid bytes become U+FFFD. At most three bytes are ever held back.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, continuing any sequence left over from the last call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back. A truncated sequence at the very
    /// end of the input decodes to U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    #[cfg(test)]
    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Price is what you pay — value is what you get. 价值 投资 💰🦉 café";

    #[test]
    fn test_every_single_split_point_roundtrips() {
        let bytes = SAMPLE.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut text = decoder.decode(&bytes[..split]);
            text.push_str(&decoder.decode(&bytes[split..]));
            text.push_str(&decoder.finish());
            assert_eq!(text, SAMPLE, "split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time_roundtrips() {
        let mut decoder = Utf8Decoder::new();
        let mut text = String::new();
        for byte in SAMPLE.as_bytes() {
            text.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        text.push_str(&decoder.finish());
        assert_eq!(text, SAMPLE);
    }

    #[test]
    fn test_holds_back_partial_sequence() {
        let owl = "🦉".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&owl[..2]), "");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&owl[2..]), "🦉");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushes_as_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
