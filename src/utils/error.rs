//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs.

use thiserror::Error;

/// Errors that can occur while framing and decoding a trace
#[derive(Error, Debug)]
pub enum IngestError {
    /// API misuse, e.g. streaming the body before the header was read.
    /// Never recovered.
    #[error("sequence error: {0}")]
    Sequence(&'static str),

    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// One body line failed to parse or lacks `time`/`name`.
    /// `line` is 1-based within the file (the header is line 1).
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Line number of the offending record, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::MalformedHeader { .. } => Some(1),
            IngestError::MalformedRecord { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Errors raised when looking up or analysing an extracted series.
///
/// These are reported to the caller as empty results with a diagnostic,
/// not as process failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("unknown series: {key}")]
    UnknownSeries { key: String },

    #[error("empty series: {key}")]
    EmptySeries { key: String },

    #[error("series {key} has no column {column}")]
    UnknownColumn { key: String, column: String },

    #[error("series {key} column {column} is not numeric at time {time}")]
    NonNumeric {
        key: String,
        column: String,
        time: f64,
    },
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid extraction policy: {0}")]
    InvalidPolicy(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
