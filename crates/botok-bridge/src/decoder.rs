//! Byte-line stream decoder.
//!
//! The tokenizer script cannot be trusted to write UTF-8 through a
//! line-buffered pipe on every platform, so it sends its result as numbers:
//!
//! ```text
//! 3        <- payload length N
//! 72       <- byte 0
//! 105      <- byte 1
//! 33       <- byte 2
//! ```
//!
//! Lines are trimmed before parsing. Lines after the N-th byte are counted and
//! ignored. A zero length ends decoding immediately.

use std::io::BufRead;

use crate::config::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::error::{DecodeError, LaunchError, ProtocolError, TokenizeError, TokenizeResult};

/// Upper bound on the capacity reserved from the length line alone.
const PREALLOC_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    AwaitingLength,
    AccumulatingBytes { remaining: usize },
    Done,
}

/// Incremental decoder for the byte-line protocol.
#[derive(Debug)]
pub struct ByteStreamDecoder {
    state: DecoderState,
    expected: usize,
    buffer: Vec<u8>,
    lines_read: usize,
    ignored_lines: usize,
    max_payload_bytes: usize,
}

impl Default for ByteStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStreamDecoder {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_BYTES)
    }

    /// Creates a decoder rejecting declared lengths above `max_payload_bytes`.
    pub fn with_max_payload(max_payload_bytes: usize) -> Self {
        Self {
            state: DecoderState::AwaitingLength,
            expected: 0,
            buffer: Vec::new(),
            lines_read: 0,
            ignored_lines: 0,
            max_payload_bytes,
        }
    }

    /// Feeds one line of script output.
    pub fn push_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.lines_read += 1;
        let line = line.trim();

        match self.state {
            DecoderState::AwaitingLength => {
                let length: i64 = line.parse().map_err(|_| ProtocolError::InvalidLength {
                    value: line.to_string(),
                })?;
                let length = u64::try_from(length)
                    .map_err(|_| ProtocolError::NegativeLength { length })?;
                let length = usize::try_from(length)
                    .ok()
                    .filter(|&n| n <= self.max_payload_bytes)
                    .ok_or(ProtocolError::LengthTooLarge {
                        length,
                        max: self.max_payload_bytes,
                    })?;

                self.expected = length;
                self.buffer = Vec::with_capacity(length.min(PREALLOC_LIMIT));
                self.state = if length == 0 {
                    DecoderState::Done
                } else {
                    DecoderState::AccumulatingBytes { remaining: length }
                };
            }
            DecoderState::AccumulatingBytes { remaining } => {
                let value: i64 = line.parse().map_err(|_| ProtocolError::InvalidByte {
                    line: self.lines_read,
                    value: line.to_string(),
                })?;
                let byte = u8::try_from(value).map_err(|_| ProtocolError::ByteOutOfRange {
                    line: self.lines_read,
                    value,
                })?;
                self.buffer.push(byte);
                self.state = if remaining == 1 {
                    DecoderState::Done
                } else {
                    DecoderState::AccumulatingBytes {
                        remaining: remaining - 1,
                    }
                };
            }
            DecoderState::Done => self.ignored_lines += 1,
        }

        Ok(())
    }

    /// Returns true once the declared number of bytes has been read.
    pub fn is_done(&self) -> bool {
        self.state == DecoderState::Done
    }

    /// Returns the number of lines read after the payload was complete.
    pub fn ignored_lines(&self) -> usize {
        self.ignored_lines
    }

    /// Consumes the decoder and decodes the payload as UTF-8.
    pub fn finish(self) -> TokenizeResult<String> {
        match self.state {
            DecoderState::AwaitingLength => Ok(String::new()),
            DecoderState::AccumulatingBytes { .. } => Err(ProtocolError::Truncated {
                expected: self.expected,
                received: self.buffer.len(),
            }
            .into()),
            DecoderState::Done => {
                if self.ignored_lines > 0 {
                    tracing::warn!(
                        ignored = self.ignored_lines,
                        expected = self.expected,
                        "tokenizer wrote lines past the declared payload length"
                    );
                }
                String::from_utf8(self.buffer)
                    .map_err(|e| TokenizeError::Decode(DecodeError::InvalidUtf8(e)))
            }
        }
    }
}

/// Decodes a fallible line stream with the default payload limit.
pub fn decode<I, S, E>(lines: I) -> TokenizeResult<String>
where
    I: IntoIterator<Item = Result<S, E>>,
    S: AsRef<str>,
    TokenizeError: From<E>,
{
    decode_with_limit(lines, DEFAULT_MAX_PAYLOAD_BYTES)
}

/// Decodes a fallible line stream, rejecting lengths above `max_payload_bytes`.
///
/// Stops pulling lines as soon as a zero length is read; otherwise the stream
/// is consumed to its end.
pub fn decode_with_limit<I, S, E>(lines: I, max_payload_bytes: usize) -> TokenizeResult<String>
where
    I: IntoIterator<Item = Result<S, E>>,
    S: AsRef<str>,
    TokenizeError: From<E>,
{
    let mut decoder = ByteStreamDecoder::with_max_payload(max_payload_bytes);
    for line in lines {
        let line = line?;
        decoder.push_line(line.as_ref())?;
        if decoder.is_done() && decoder.expected == 0 {
            break;
        }
    }
    decoder.finish()
}

/// Decodes an infallible sequence of lines.
pub fn decode_lines<I, S>(lines: I) -> TokenizeResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    decode(lines.into_iter().map(Ok::<S, std::convert::Infallible>))
}

/// Decodes a protocol stream from any buffered reader.
pub fn decode_reader<R: BufRead>(reader: R) -> TokenizeResult<String> {
    decode(reader.lines().map(|line| line.map_err(LaunchError::ReadOutput)))
}

/// Encodes text as protocol lines, the way the tokenizer script writes them.
pub fn encode_payload(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut lines = Vec::with_capacity(bytes.len() + 1);
    lines.push(bytes.len().to_string());
    lines.extend(bytes.iter().map(|b| b.to_string()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn protocol_err(result: TokenizeResult<String>) -> ProtocolError {
        match result {
            Err(TokenizeError::Protocol(e)) => e,
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_lines(["3", "72", "105", "33"]).unwrap(), "Hi!");
    }

    #[test]
    fn test_decode_tibetan() {
        let text = "བཀྲ་ཤིས་ བདེ་ལེགས།";
        let lines = encode_payload(text);
        assert_eq!(lines[0], text.len().to_string());
        assert_eq!(decode_lines(&lines).unwrap(), text);
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(decode_lines(["0"]).unwrap(), "");
        assert_eq!(decode_lines(["0", "junk", "-9"]).unwrap(), "");
    }

    #[test]
    fn test_zero_length_stops_reading() {
        let mut pulled = 0;
        let lines = ["0", "1", "2", "3"].into_iter().inspect(|_| pulled += 1);
        assert_eq!(decode_lines(lines).unwrap(), "");
        assert_eq!(pulled, 1);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decode_lines(Vec::<String>::new()).unwrap(), "");
    }

    #[test]
    fn test_trims_line_endings() {
        assert_eq!(decode_lines(["2\r", " 111 ", "107\r"]).unwrap(), "ok");
    }

    #[test]
    fn test_negative_length() {
        assert_eq!(
            protocol_err(decode_lines(["-1", "65"])),
            ProtocolError::NegativeLength { length: -1 }
        );
    }

    #[test]
    fn test_non_numeric_length() {
        assert_eq!(
            protocol_err(decode_lines(["three", "72"])),
            ProtocolError::InvalidLength {
                value: "three".to_string()
            }
        );
        assert!(matches!(
            protocol_err(decode_lines([""])),
            ProtocolError::InvalidLength { .. }
        ));
    }

    #[test]
    fn test_length_limit() {
        let err = protocol_err(decode_with_limit(
            ["10", "1"].map(Ok::<_, std::convert::Infallible>),
            4,
        ));
        assert_eq!(err, ProtocolError::LengthTooLarge { length: 10, max: 4 });
    }

    #[test]
    fn test_huge_length_does_not_allocate() {
        let err = protocol_err(decode_lines(["9000000000000", "1"]));
        assert!(matches!(err, ProtocolError::LengthTooLarge { .. }));
    }

    #[test]
    fn test_invalid_byte() {
        assert_eq!(
            protocol_err(decode_lines(["2", "72", "x"])),
            ProtocolError::InvalidByte {
                line: 3,
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_byte_out_of_range() {
        assert_eq!(
            protocol_err(decode_lines(["2", "256", "1"])),
            ProtocolError::ByteOutOfRange { line: 2, value: 256 }
        );
        assert_eq!(
            protocol_err(decode_lines(["1", "-3"])),
            ProtocolError::ByteOutOfRange { line: 2, value: -3 }
        );
    }

    #[test]
    fn test_truncated_stream() {
        assert_eq!(
            protocol_err(decode_lines(["4", "72", "105"])),
            ProtocolError::Truncated {
                expected: 4,
                received: 2
            }
        );
    }

    #[test]
    fn test_trailing_lines_ignored() {
        let mut decoder = ByteStreamDecoder::new();
        for line in ["2", "104", "105", "33", "not even a number"] {
            decoder.push_line(line).unwrap();
        }
        assert!(decoder.is_done());
        assert_eq!(decoder.ignored_lines(), 2);
        assert_eq!(decoder.finish().unwrap(), "hi");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode_lines(["2", "195", "40"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_stream_error_propagates() {
        let lines: Vec<Result<String, LaunchError>> = vec![
            Ok("3".to_string()),
            Err(LaunchError::Timeout { timeout_ms: 10 }),
        ];
        let err = decode(lines).unwrap_err();
        assert!(matches!(
            err,
            TokenizeError::Launch(LaunchError::Timeout { timeout_ms: 10 })
        ));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let lines = encode_payload("ཀ་ཁ་ག");
        let first = decode_lines(lines.clone()).unwrap();
        let second = decode_lines(lines).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_reader() {
        let input = "5\n104\n101\n108\n108\n111\n";
        assert_eq!(decode_reader(input.as_bytes()).unwrap(), "hello");
    }
}
