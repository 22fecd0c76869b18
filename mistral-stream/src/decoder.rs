//! Incremental record decoder for the chat completion event stream.
//!
//! The body is UTF-8 text where each record ends with a blank line:
//! ```text
//! data: {"id":"cmpl-1","object":"chat.completion.chunk","created":1,"model":"mistral-tiny","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}
//!
//! data: {"id":"cmpl-1","object":"chat.completion.chunk","created":1,"model":"mistral-tiny","choices":[{"index":0,"delta":{"content":"lo"},"finish_reason":null}]}
//!
//! data: [DONE]
//!
//! ```
//!
//! Network chunks carry no framing guarantee, so [`RecordDecoder`] keeps both
//! the undecoded tail of a split multi-byte character and the text of the
//! record in progress between calls to [`RecordDecoder::feed`].
//!
//! Boundaries are found on raw characters: a `'\n'` arriving while the
//! buffered text already ends in `'\n'`. A payload containing a literal blank
//! line therefore ends its record early; the service never sends one.

use crate::error::MistralError;
use crate::types::ChatChunk;

/// Field prefix every data record starts with.
const DATA_PREFIX: &str = "data:";

/// Terminal marker, either bare or as the value of the data field.
const DONE_MARKER: &str = "[DONE]";

/// Terminal marker as a complete record.
const DONE_RECORD: &str = "data: [DONE]";

/// What one completed record produced.
#[derive(Debug)]
pub enum Decoded {
    /// Text of the first choice's delta (`""` when it carries no content).
    Token(String),
    /// The terminal marker was recognized; the stream ended gracefully.
    Done,
    /// The record was malformed; decoding cannot continue.
    Error(MistralError),
}

/// Classification of one completed record.
enum Record {
    Token(String),
    Done,
}

/// Reassembles records from arbitrarily split byte chunks.
///
/// One decoder serves exactly one response body. Once it has produced
/// [`Decoded::Done`] or [`Decoded::Error`] it is finished and ignores any
/// further input.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    /// Leading bytes of a multi-byte character cut off at the end of the last chunk.
    carry: Vec<u8>,
    /// Text received since the last completed record.
    buffer: String,
    finished: bool,
}

impl RecordDecoder {
    /// A decoder with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk and return the events of every record it completed, in order.
    ///
    /// Tokens completed earlier in the chunk are returned ahead of a
    /// terminating [`Decoded::Done`] or [`Decoded::Error`]; nothing after the
    /// terminating event is scanned.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        if self.finished {
            return Vec::new();
        }

        let text = self.decode_utf8(chunk);
        let mut events = Vec::new();

        for ch in text.chars() {
            if ch != '\n' || !self.buffer.ends_with('\n') {
                self.buffer.push(ch);
                continue;
            }

            let record = std::mem::take(&mut self.buffer);
            match parse_record(&record) {
                Ok(Record::Token(token)) => events.push(Decoded::Token(token)),
                Ok(Record::Done) => {
                    tracing::debug!("terminal marker received");
                    self.finish_early();
                    events.push(Decoded::Done);
                    break;
                }
                Err(err) => {
                    self.finish_early();
                    events.push(Decoded::Error(err));
                    break;
                }
            }
        }

        events
    }

    /// Text buffered since the last completed record.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Whether a terminal marker or an error has been produced.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume the decoder at end of input, returning the unterminated
    /// trailing text, if any. That text is never dispatched as a record.
    pub fn finish(self) -> Option<String> {
        let mut rest = self.buffer;
        if !self.carry.is_empty() {
            rest.push_str(&String::from_utf8_lossy(&self.carry));
        }
        (!rest.trim().is_empty()).then_some(rest)
    }

    fn finish_early(&mut self) {
        self.finished = true;
        self.buffer.clear();
        self.carry.clear();
    }

    /// Decode `chunk` prefixed by the carried bytes.
    ///
    /// Invalid sequences become U+FFFD; an incomplete sequence at the end is
    /// carried into the next call.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
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
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }
}

/// Classify one completed record.
fn parse_record(record: &str) -> Result<Record, MistralError> {
    let trimmed = record.trim();
    if trimmed == DONE_RECORD || trimmed == DONE_MARKER {
        return Ok(Record::Done);
    }

    let Some(payload) = record.strip_prefix(DATA_PREFIX) else {
        return Err(MistralError::Protocol {
            record: record.to_string(),
        });
    };

    let payload = payload.trim();
    if payload == DONE_MARKER {
        return Ok(Record::Done);
    }

    let chunk: ChatChunk = serde_json::from_str(payload).map_err(|source| MistralError::Parse {
        source,
        record: record.to_string(),
    })?;
    Ok(Record::Token(chunk.token().to_string()))
}
