//! Splits a raw trace stream into one metadata header and a body of lines.
//!
//! A qlog-style trace is not one JSON document: the first line is a
//! metadata record and every following line is an event record. Parsing
//! the whole input as a single document breaks as soon as the body is
//! appended, so the header is read alone and the body is handed out as a
//! forward-only cursor that never buffers more than one line.

use crate::utils::config::RECORD_SEPARATOR;
use crate::utils::error::IngestError;
use log::debug;
use serde::Serialize;
use std::io::BufRead;

/// Metadata record parsed from the first line of a trace.
///
/// The attributes are defined by the trace format and kept as-is;
/// a few well-known qlog attributes have accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TraceMetadata {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl TraceMetadata {
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fields
    }

    pub fn qlog_version(&self) -> Option<&str> {
        self.get("qlog_version").and_then(|v| v.as_str())
    }

    pub fn qlog_format(&self) -> Option<&str> {
        self.get("qlog_format").and_then(|v| v.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(|v| v.as_str())
    }
}

/// One body line with its 1-based position in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    AwaitingHeader,
    HeaderRead,
    HeaderFailed,
    BodyTaken,
}

/// Forward-only reader over one trace stream.
///
/// Call [`TraceReader::read_header`] exactly once, then
/// [`TraceReader::stream_body`] exactly once. Any other order is a
/// `Sequence` error.
pub struct TraceReader<R> {
    reader: Option<R>,
    state: ReaderState,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            state: ReaderState::AwaitingHeader,
        }
    }

    /// Consume and parse exactly the first line
    ///
    /// # Errors
    /// * `IngestError::Sequence` - header already read or body already taken
    /// * `IngestError::MalformedHeader` - empty input, invalid JSON, or not an object
    /// * `IngestError::Io` - underlying read failure
    pub fn read_header(&mut self) -> Result<TraceMetadata, IngestError> {
        if self.state != ReaderState::AwaitingHeader {
            return Err(IngestError::Sequence("trace header was already consumed"));
        }
        let reader = self
            .reader
            .as_mut()
            .ok_or(IngestError::Sequence("trace stream is gone"))?;

        // Whatever happens below, the first line is gone
        self.state = ReaderState::HeaderFailed;

        let text = match read_raw_line(reader)? {
            None => {
                return Err(IngestError::MalformedHeader {
                    reason: "input is empty".to_string(),
                })
            }
            Some(Err(reason)) => return Err(IngestError::MalformedHeader { reason }),
            Some(Ok(text)) => text,
        };

        let value: serde_json::Value =
            serde_json::from_str(clean_line(&text)).map_err(|e| IngestError::MalformedHeader {
                reason: e.to_string(),
            })?;

        match value {
            serde_json::Value::Object(fields) => {
                self.state = ReaderState::HeaderRead;
                debug!("Trace header parsed with {} attributes", fields.len());
                Ok(TraceMetadata::new(fields))
            }
            other => Err(IngestError::MalformedHeader {
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Hand out the remaining lines as a lazy, single-use cursor
    ///
    /// # Errors
    /// * `IngestError::Sequence` - header not read yet, or body already taken
    pub fn stream_body(&mut self) -> Result<BodyLines<R>, IngestError> {
        match self.state {
            ReaderState::AwaitingHeader => {
                return Err(IngestError::Sequence("body requested before the header was read"))
            }
            ReaderState::HeaderFailed => {
                return Err(IngestError::Sequence("body requested after the header failed to parse"))
            }
            ReaderState::BodyTaken => {
                return Err(IngestError::Sequence("trace body can only be streamed once"))
            }
            ReaderState::HeaderRead => {}
        }

        let reader = self
            .reader
            .take()
            .ok_or(IngestError::Sequence("trace stream is gone"))?;
        self.state = ReaderState::BodyTaken;

        Ok(BodyLines {
            reader,
            line_number: 1,
            done: false,
        })
    }
}

/// Lazy iterator over the body lines of a trace.
///
/// Blank lines are skipped but still counted, so `RawLine::number` always
/// matches the line in the file.
pub struct BodyLines<R> {
    reader: R,
    line_number: usize,
    done: bool,
}

impl<R> BodyLines<R> {
    /// Number of physical lines consumed so far, header included
    pub fn lines_read(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for BodyLines<R> {
    type Item = Result<RawLine, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let raw = match read_raw_line(&mut self.reader) {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            self.line_number += 1;

            let text = match raw {
                Ok(text) => text,
                Err(reason) => {
                    return Some(Err(IngestError::MalformedRecord {
                        line: self.line_number,
                        reason,
                    }))
                }
            };

            let cleaned = clean_line(&text);
            if cleaned.is_empty() {
                continue;
            }

            return Some(Ok(RawLine {
                number: self.line_number,
                text: cleaned.to_string(),
            }));
        }
        None
    }
}

/// Read one physical line; the inner `Err` is a non-UTF-8 line, which is a
/// record-level problem rather than an I/O failure.
fn read_raw_line<R: BufRead>(
    reader: &mut R,
) -> std::io::Result<Option<Result<String, String>>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(
        String::from_utf8(buf).map_err(|e| format!("line is not valid UTF-8: {}", e)),
    ))
}

/// Strip line terminators, surrounding whitespace and a JSON-SEQ record separator
fn clean_line(text: &str) -> &str {
    text.trim()
        .trim_start_matches(RECORD_SEPARATOR)
        .trim()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
