//! End-to-end ingestion pipeline.
//!
//! Framer -> decoder -> extraction policy -> dedup/pivot, in one forward
//! pass over the body. All trace state lives in the returned [`Trace`], so
//! several traces can be ingested side by side.

use crate::aggregator::{detect_runs, RunInterval, SeriesBuilder, SeriesTable};
use crate::extract::{extract, SeriesKey};
use crate::parser::{decode, TraceMetadata, TraceReader};
use crate::utils::config::{DecodeErrorPolicy, IngestConfig};
use crate::utils::error::{IngestError, SeriesError};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Counters collected during one ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Physical lines read, header included
    pub lines: usize,
    /// Records that decoded successfully
    pub records: usize,
    /// Lines skipped under `on_decode_error = skip`
    pub malformed: usize,
    /// Rows dropped across all series for repeating a timestamp
    pub duplicates_dropped: usize,
    /// Number of distinct series keys
    pub series: usize,
}

/// One ingested trace
#[derive(Debug, Clone)]
pub struct Trace {
    pub metadata: TraceMetadata,
    pub stats: IngestStats,
    tables: BTreeMap<SeriesKey, SeriesTable>,
}

impl Trace {
    /// Look up one series
    ///
    /// # Errors
    /// * `SeriesError::UnknownSeries` - no record contributed to `key`
    pub fn series(&self, key: &str) -> Result<&SeriesTable, SeriesError> {
        self.tables.get(key).ok_or_else(|| SeriesError::UnknownSeries {
            key: key.to_string(),
        })
    }

    pub fn series_keys(&self) -> impl Iterator<Item = &SeriesKey> + '_ {
        self.tables.keys()
    }

    /// All tables in key order
    pub fn tables(&self) -> impl Iterator<Item = &SeriesTable> + '_ {
        self.tables.values()
    }

    /// Closed contiguous runs of a numeric column
    ///
    /// # Errors
    /// * `SeriesError::UnknownSeries` / `UnknownColumn` - nothing to analyse
    /// * `SeriesError::NonNumeric` - the column holds non-numeric values
    /// * `SeriesError::EmptySeries` - the column has no present values
    pub fn runs(&self, key: &str, column: &str) -> Result<Vec<RunInterval>, SeriesError> {
        let points = self.series(key)?.numeric_points(column)?;
        detect_runs(key, &points)
    }
}

/// Ingest a trace from any buffered reader
///
/// # Errors
/// * `IngestError::MalformedHeader` - first line is not a JSON object
/// * `IngestError::MalformedRecord` - a body line is malformed and the policy is `abort`
/// * `IngestError::Io` - read failure
pub fn ingest_reader<R: BufRead>(reader: R, config: &IngestConfig) -> Result<Trace, IngestError> {
    let mut trace_reader = TraceReader::new(reader);
    let metadata = trace_reader.read_header()?;
    let mut body = trace_reader.stream_body()?;

    let mut builder = SeriesBuilder::new();
    let mut records = 0;
    let mut malformed = 0;

    for line in body.by_ref() {
        let record = match line.and_then(|line| decode(&line)) {
            Ok(record) => record,
            Err(err @ IngestError::MalformedRecord { .. })
                if config.on_decode_error == DecodeErrorPolicy::Skip =>
            {
                warn!("Skipping {}", err);
                malformed += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        records += 1;
        for row in extract(&record, &config.policies) {
            builder.push(row);
        }
    }

    let duplicates_dropped = builder.duplicates_dropped();
    let tables = builder.finish();
    let stats = IngestStats {
        lines: body.lines_read(),
        records,
        malformed,
        duplicates_dropped,
        series: tables.len(),
    };

    debug!("Ingest stats: {:?}", stats);
    if malformed > 0 {
        warn!("{} malformed line(s) skipped", malformed);
    }

    Ok(Trace {
        metadata,
        stats,
        tables,
    })
}

/// Open and ingest a trace file
pub fn ingest_path(path: impl AsRef<Path>, config: &IngestConfig) -> Result<Trace, IngestError> {
    let path = path.as_ref();
    info!("Reading trace: {}", path.display());

    let file = File::open(path)?;
    let trace = ingest_reader(BufReader::new(file), config)?;

    info!(
        "Ingested {} records into {} series",
        trace.stats.records, trace.stats.series
    );
    Ok(trace)
}
