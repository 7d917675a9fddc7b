//! qlog-series
//!
//! Trace ingestion and time-series extraction for qlog-style transport
//! event traces: one metadata line followed by a stream of
//! `{time, name, data}` event records.
//!
//! The pipeline runs in one forward pass:
//! - [`parser`] frames the header and body and decodes event records
//! - [`extract`] applies a per-event-name policy to turn payloads into rows
//! - [`aggregator`] deduplicates rows by timestamp, pivots them into
//!   [`SeriesTable`]s and finds contiguous runs (loss bursts)
//! - [`output`] renders tables and bursts for charting front-ends
//!
//! ```ignore
//! use qlog_series::{ingest_path, IngestConfig};
//!
//! let trace = ingest_path("client.qlog", &IngestConfig::default())?;
//! let bursts = trace.runs("recovery:packet_lost:header", "packet_number")?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod extract;
pub mod output;
pub mod parser;
pub mod utils;

pub use aggregator::{RunInterval, SeriesTable};
pub use commands::{ingest_path, ingest_reader, IngestStats, Trace};
pub use extract::{EventPolicy, PolicyTable, SeriesKey};
pub use utils::config::{DecodeErrorPolicy, IngestConfig};
