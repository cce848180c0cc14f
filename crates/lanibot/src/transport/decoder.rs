/// Reassembles lines from a chunked byte stream.
///
/// Decoding is incremental: a multi-byte character split across two chunks is
/// held back until its remaining bytes arrive. Invalid sequences decode to
/// U+FFFD rather than failing. Text after the last line break is kept in the
/// buffer until a later chunk completes it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    partial_char: Vec<u8>,
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` and return every line it completed, without the trailing `\n`
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode(chunk);
        // The buffer never holds a line break between calls
        let last_break = text.rfind('\n').map(|offset| self.buffer.len() + offset);
        self.buffer.push_str(&text);

        let Some(last_break) = last_break else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_break + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete[..last_break]
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// Text received after the last line break, not yet part of any line
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Consume the decoder, returning whatever never formed a complete line
    pub fn finish(self) -> String {
        let mut rest = self.buffer;
        if !self.partial_char.is_empty() {
            rest.push(char::REPLACEMENT_CHARACTER);
        }
        rest
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.partial_char);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut input = bytes.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = input.split_at(err.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        text.push_str(valid);
                    }
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &after[len..];
                        }
                        // Truncated character at the end of the chunk
                        None => {
                            input = after;
                            break;
                        }
                    }
                }
            }
        }
        self.partial_char = input.to_vec();
        text
    }
}
