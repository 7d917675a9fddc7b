//! Decodes one body line into an [`EventRecord`].
//!
//! The decoder only checks the envelope (`time`, `name`, `data`); the shape
//! of `data` is left to the extraction policy.

use super::framer::RawLine;
use super::value::{mapping_from_json, Mapping};
use crate::utils::error::IngestError;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Event timestamp.
///
/// Always finite, so it can be totally ordered and used as a table index.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(f64);

impl Timestamp {
    /// Returns `None` for NaN and infinities. `-0.0` is stored as `0.0`.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value + 0.0))
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// One timestamped, named event with its payload
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: Timestamp,
    pub name: String,
    pub data: Mapping,
    /// Line in the source file the record came from
    pub line: usize,
}

/// Parse a body line into an event record
///
/// # Errors
/// * `IngestError::MalformedRecord` - not a JSON object, missing or mistyped
///   `time`/`name`, or a `data` field that is not an object
pub fn decode(line: &RawLine) -> Result<EventRecord, IngestError> {
    let malformed = |reason: String| IngestError::MalformedRecord {
        line: line.number,
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_str(&line.text).map_err(|e| malformed(e.to_string()))?;

    let serde_json::Value::Object(mut obj) = value else {
        return Err(malformed("record is not a JSON object".to_string()));
    };

    let time = match obj.get("time") {
        Some(raw) => parse_time(raw).map_err(malformed)?,
        None => return Err(malformed("missing field `time`".to_string())),
    };

    let name = match obj.remove("name") {
        Some(serde_json::Value::String(name)) => name,
        Some(other) => return Err(malformed(format!("field `name` must be a string, found {}", other))),
        None => return Err(malformed("missing field `name`".to_string())),
    };

    let data = match obj.remove("data") {
        None | Some(serde_json::Value::Null) => Mapping::new(),
        Some(serde_json::Value::Object(data)) => mapping_from_json(data),
        Some(other) => {
            return Err(malformed(format!("field `data` must be an object, found {}", other)))
        }
    };

    Ok(EventRecord {
        time,
        name,
        data,
        line: line.number,
    })
}

/// Accept a JSON number or a string holding a decimal number
fn parse_time(raw: &serde_json::Value) -> Result<Timestamp, String> {
    let value = if let Some(n) = raw.as_f64() {
        n
    } else if let Some(s) = raw.as_str() {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid `time` value {:?}: {}", s, e))?
    } else {
        return Err(format!("field `time` must be numeric, found {}", raw));
    };

    Timestamp::new(value).ok_or_else(|| format!("field `time` is not finite: {}", value))
}
