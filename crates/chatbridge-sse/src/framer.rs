//! Event framing.
//!
//! Network reads split the backend stream at arbitrary points, including in
//! the middle of a line, of the `\n\n` delimiter, or of a multi-byte UTF-8
//! character. [`EventFramer`] accumulates reads and hands out only complete
//! event blocks, keeping the unterminated tail for the next call.

/// Blank line separating two SSE events.
pub const EVENT_DELIMITER: &str = "\n\n";

#[derive(Debug, Default)]
pub struct EventFramer {
    /// Decoded text after the last complete delimiter.
    buffer: String,
    /// Leading bytes of a UTF-8 character whose remaining bytes have not
    /// arrived yet (at most 3).
    utf8_carry: Vec<u8>,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network read and return every event block it completed.
    ///
    /// Blocks are returned without their trailing delimiter. Empty blocks
    /// (a leading delimiter, or two delimiters in a row) are dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let old_len = self.buffer.len();
        self.decode_into_buffer(bytes);

        // The retained tail never holds a full delimiter, so only a match
        // that starts on its last `\n` or later can be new.
        let start = if self.buffer[..old_len].ends_with('\n') {
            old_len - 1
        } else {
            old_len
        };

        // `match_indices` walks non-overlapping matches left to right, the
        // same way `split` does, so the cut lands where splitting the whole
        // stream at once would have put it.
        let Some(end) = self.buffer[start..]
            .match_indices(EVENT_DELIMITER)
            .last()
            .map(|(idx, delim)| start + idx + delim.len())
        else {
            return Vec::new();
        };

        let tail = self.buffer.split_off(end);
        let complete = std::mem::replace(&mut self.buffer, tail);

        complete
            .split(EVENT_DELIMITER)
            .filter(|block| !block.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Text received since the last complete event.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Bytes of an incomplete UTF-8 character still waiting for the rest.
    pub fn pending_bytes(&self) -> usize {
        self.utf8_carry.len()
    }

    fn decode_into_buffer(&mut self, bytes: &[u8]) {
        let mut input = std::mem::take(&mut self.utf8_carry);
        input.extend_from_slice(bytes);

        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        None => {
                            self.utf8_carry = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}
