//! Engine-to-visualization report.
//!
//! Charting front-ends consume series tables and burst intervals. Requests
//! for series or columns that have no data are not failures here: they
//! come back as empty results with a diagnostic, since an empty chart is a
//! normal thing to display.

use crate::aggregator::{RunInterval, SeriesTable};
use crate::commands::ingest::{IngestStats, Trace};
use crate::parser::{Timestamp, TraceMetadata, Value};
use crate::utils::config::REPORT_SCHEMA_VERSION;
use log::warn;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Top-level report written to JSON
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Schema version for compatibility checking
    pub version: &'static str,

    /// Trace file the report was computed from
    pub source: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    pub metadata: &'a TraceMetadata,

    pub stats: IngestStats,

    pub series: Vec<SeriesReport<'a>>,

    pub bursts: Vec<BurstReport>,

    /// Lookups that produced no data
    pub diagnostics: Vec<String>,
}

/// One series table, row by row
#[derive(Debug, Serialize)]
pub struct SeriesReport<'a> {
    pub key: Cow<'a, str>,
    pub columns: &'a [String],
    pub duplicates_dropped: usize,
    pub rows: Vec<RowReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// One table row. Missing cells are listed by column name instead of
/// being written as `null`, which is a real payload value.
#[derive(Debug, Serialize)]
pub struct RowReport<'a> {
    pub time: Timestamp,
    pub values: BTreeMap<&'a str, &'a Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'a str>,
}

/// Burst intervals for one counter column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstReport {
    pub key: String,
    pub column: String,
    pub intervals: Vec<RunInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// A `KEY=COLUMN` request for burst detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstRequest {
    pub key: String,
    pub column: String,
}

impl FromStr for BurstRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, column)) if !key.is_empty() && !column.is_empty() => Ok(Self {
                key: key.to_string(),
                column: column.to_string(),
            }),
            _ => Err(format!("expected KEY=COLUMN, got {:?}", s)),
        }
    }
}

impl<'a> SeriesReport<'a> {
    pub fn from_table(table: &'a SeriesTable) -> Self {
        let columns = table.columns();
        let rows = table
            .rows()
            .map(|row| {
                let mut values = BTreeMap::new();
                let mut missing = Vec::new();
                for (column, cell) in columns.iter().zip(row.cells) {
                    if cell.is_missing() {
                        missing.push(column.as_str());
                    } else {
                        values.insert(column.as_str(), cell);
                    }
                }
                RowReport {
                    time: row.time,
                    values,
                    missing,
                }
            })
            .collect();

        Self {
            key: Cow::Borrowed(table.key().as_str()),
            columns,
            duplicates_dropped: table.duplicates_dropped(),
            rows,
            diagnostic: None,
        }
    }

    /// Empty result for a key the trace has no table for
    pub fn empty(key: &str, diagnostic: String) -> Self {
        Self {
            key: Cow::Owned(key.to_string()),
            columns: &[],
            duplicates_dropped: 0,
            rows: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

/// Run burst detection, turning any lookup failure into a diagnostic
pub fn burst_report(trace: &Trace, request: &BurstRequest) -> BurstReport {
    let (intervals, diagnostic) = match trace.runs(&request.key, &request.column) {
        Ok(intervals) => (intervals, None),
        Err(err) => {
            warn!("No bursts for {}={}: {}", request.key, request.column, err);
            (Vec::new(), Some(err.to_string()))
        }
    };

    BurstReport {
        key: request.key.clone(),
        column: request.column.clone(),
        intervals,
        diagnostic,
    }
}

/// Resolve requested series keys; an empty request selects everything.
///
/// Unknown keys come back as empty series carrying a diagnostic, in
/// request order.
pub fn select_series<'a>(trace: &'a Trace, keys: &[String]) -> Vec<SeriesReport<'a>> {
    if keys.is_empty() {
        return trace.tables().map(SeriesReport::from_table).collect();
    }

    keys.iter()
        .map(|key| match trace.series(key) {
            Ok(table) => SeriesReport::from_table(table),
            Err(err) => {
                warn!("{}", err);
                SeriesReport::empty(key, err.to_string())
            }
        })
        .collect()
}

/// Assemble the full report for a trace
pub fn build_report<'a>(
    trace: &'a Trace,
    source: &str,
    keys: &[String],
    bursts: &[BurstRequest],
) -> Report<'a> {
    use chrono::Utc;

    let series = select_series(trace, keys);
    let bursts: Vec<BurstReport> = bursts.iter().map(|req| burst_report(trace, req)).collect();
    let diagnostics = series
        .iter()
        .filter_map(|s| s.diagnostic.as_ref())
        .chain(bursts.iter().filter_map(|b| b.diagnostic.as_ref()))
        .cloned()
        .collect();

    Report {
        version: REPORT_SCHEMA_VERSION,
        source: source.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        metadata: &trace.metadata,
        stats: trace.stats,
        series,
        bursts,
        diagnostics,
    }
}
