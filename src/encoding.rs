//! Byte-to-text decoding for received chunks.
//!
//! The encoding is chosen once, when the handler is built. UTF-8 decoding is
//! stateful: a multi-byte sequence split across two drains is held back and
//! completed by the next chunk instead of being replaced.

use serde::{Deserialize, Serialize};

/// Text encoding applied to every received chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// UTF-8; invalid sequences become U+FFFD.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit ASCII; bytes above 0x7F become U+FFFD.
    Ascii,
}

/// Stateful decoder owned by one reader session.
#[derive(Debug, Clone)]
pub struct TextDecoder {
    encoding: TextEncoding,
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Bytes held back waiting for the rest of a UTF-8 sequence.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Decode one chunk. May return an empty string when the whole chunk is
    /// the start of an incomplete sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        match self.encoding {
            TextEncoding::Utf8 => self.decode_utf8(chunk),
            TextEncoding::Latin1 => chunk.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Ascii => chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        char::from(b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
        }
    }

    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Truncated sequence at the end of the chunk.
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_utf8_plain_chunk() {
        let mut decoder = TextDecoder::new(TextEncoding::Utf8);
        assert_eq!(decoder.decode(b"hello\r\n"), "hello\r\n");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_utf8_sequence_split_across_chunks() {
        let mut decoder = TextDecoder::new(TextEncoding::Utf8);
        let bytes = "tempé°".as_bytes();
        let (first, second) = bytes.split_at(bytes.len() - 1);

        assert_eq!(decoder.decode(first), "tempé");
        assert_eq!(decoder.pending().len(), 1);
        assert_eq!(decoder.decode(second), "°");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_utf8_chunk_that_is_only_a_prefix() {
        let mut decoder = TextDecoder::new(TextEncoding::Utf8);
        let euro = "€".as_bytes();

        assert_eq!(decoder.decode(&euro[..2]), "");
        assert_eq!(decoder.decode(&euro[2..]), "€");
    }

    #[test]
    fn test_utf8_invalid_bytes_are_replaced() {
        let mut decoder = TextDecoder::new(TextEncoding::Utf8);
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let mut decoder = TextDecoder::new(TextEncoding::Latin1);
        assert_eq!(decoder.decode(&[0x41, 0xB0, 0xE9]), "A°é");
    }

    #[test]
    fn test_ascii_replaces_high_bytes() {
        let mut decoder = TextDecoder::new(TextEncoding::Ascii);
        assert_eq!(decoder.decode(&[0x4F, 0x4B, 0xC3]), "OK\u{FFFD}");
    }
}
