//! Streaming-safe UTF-8 decoding.
//!
//! The generation body arrives as arbitrary byte blocks, and chunk
//! boundaries land in the middle of multi-byte sequences whenever the
//! model emits non-ASCII text. [`StreamDecoder`] carries the trailing
//! incomplete sequence of each read into the next one, so callers
//! always receive valid UTF-8 and never lose a code point to a chunk
//! boundary. Invalid bytes decode to U+FFFD rather than failing the
//! stream.

/// Incremental UTF-8 decoder.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Undecoded tail of the previous input: at most 3 bytes of an
    /// incomplete multi-byte sequence.
    carry: Vec<u8>,
}

impl StreamDecoder {
    /// Create a decoder with no pending state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next block of input, returning all text that is
    /// complete so far. May return an empty string when the input only
    /// extends a still-incomplete sequence.
    pub fn decode(&mut self, input: &[u8]) -> String {
        self.carry.extend_from_slice(input);
        let buf = std::mem::take(&mut self.carry);

        let mut out = String::new();
        let mut rest = buf.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(e) => {
                    // The prefix up to valid_up_to is valid, so the
                    // lossy conversion borrows it verbatim.
                    out.push_str(&String::from_utf8_lossy(&rest[..e.valid_up_to()]));

                    match e.error_len() {
                        Some(len) => {
                            // Genuinely invalid bytes: substitute and move on.
                            out.push('\u{FFFD}');
                            rest = &rest[e.valid_up_to() + len..];
                        }
                        None => {
                            // Incomplete sequence at the end: hold it
                            // for the next read.
                            self.carry = rest[e.valid_up_to()..].to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Number of bytes held over from the previous read.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}
