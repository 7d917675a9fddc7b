//! Payload values carried by event records.
//!
//! Event payloads are dynamically shaped: a field may be absent, a scalar,
//! a nested mapping or a sequence depending on the event name. `Value` is a
//! closed set of those shapes so extraction can match on it exhaustively.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed mapping of payload values
pub type Mapping = BTreeMap<String, Value>;

/// A leaf payload value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// One payload value.
///
/// `Missing` never comes out of the decoder. It is the marker the pivot
/// stage writes into a cell that a row does not have. It is distinct from
/// `0`, `""` and JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<Value>),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric view of the value, used by the run-boundary detector.
    ///
    /// Numbers map directly; strings holding a decimal number are accepted
    /// because some producers quote large counters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Number(n)) => n.as_f64(),
            Value::Scalar(Scalar::Text(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Value::Scalar(Scalar::Text(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Mapping(mapping_from_json(obj)),
        }
    }
}

/// Convert a JSON object into a payload mapping
pub fn mapping_from_json(obj: serde_json::Map<String, serde_json::Value>) -> Mapping {
    obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}

// Missing serializes as null; callers that must keep the distinction
// (the JSON report) list missing cells separately.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(Scalar::Null) | Value::Missing => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            Value::Scalar(Scalar::Text(s)) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            Value::Scalar(Scalar::Null) => write!(f, "null"),
            Value::Scalar(Scalar::Bool(b)) => write!(f, "{}", b),
            Value::Scalar(Scalar::Number(n)) => write!(f, "{}", n),
            Value::Scalar(Scalar::Text(s)) => write!(f, "{}", s),
            // Nested shapes render compactly as JSON
            Value::Sequence(_) | Value::Mapping(_) => match serde_json::to_string(self) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}
