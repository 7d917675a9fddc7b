//! Trace framing and event decoding.
//!
//! This module handles:
//! - Splitting the metadata header from the streamed body
//! - Decoding body lines into event records
//! - The tagged payload value type shared by later stages

pub mod decoder;
pub mod framer;
pub mod value;

// Re-export main types
pub use decoder::{decode, EventRecord, Timestamp};
pub use framer::{BodyLines, RawLine, TraceMetadata, TraceReader};
pub use value::{Mapping, Scalar, Value};
