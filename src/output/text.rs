//! Plain-text rendering of a trace: the metadata, then every selected
//! table between banners, pandas-style.

use crate::aggregator::{RunInterval, SeriesTable};
use crate::parser::TraceMetadata;

const BANNER_WIDTH: usize = 80;

/// Render the metadata header as pretty JSON
pub fn format_metadata(metadata: &TraceMetadata) -> String {
    serde_json::to_string_pretty(metadata).unwrap_or_else(|_| format!("{:?}", metadata.fields()))
}

/// Render one table with a banner.
///
/// `max_rows == 0` prints every row; otherwise the first `max_rows` rows
/// are printed and the rest summarised.
pub fn format_table(table: &SeriesTable, max_rows: usize) -> String {
    let mut header = vec!["time".to_string()];
    header.extend(table.columns().iter().cloned());

    let shown = if max_rows == 0 {
        table.len()
    } else {
        max_rows.min(table.len())
    };

    let body: Vec<Vec<String>> = table
        .rows()
        .take(shown)
        .map(|row| {
            let mut cells = vec![row.time.to_string()];
            cells.extend(row.cells.iter().map(|c| c.to_string()));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::new();
    lines.push("#".repeat(BANNER_WIDTH));
    lines.push(table.key().to_string());
    lines.push("-".repeat(BANNER_WIDTH));
    lines.push(align(&header, &widths));
    for row in &body {
        lines.push(align(row, &widths));
    }
    if shown < table.len() {
        lines.push(format!("... {} more rows", table.len() - shown));
    }
    lines.push(format!(
        "[{} rows x {} columns, {} duplicates dropped]",
        table.len(),
        table.columns().len(),
        table.duplicates_dropped()
    ));
    lines.push("#".repeat(BANNER_WIDTH));
    finish(lines)
}

/// One line per burst interval
pub fn format_bursts(key: &str, column: &str, intervals: &[RunInterval]) -> String {
    let mut lines = vec![format!("bursts in {}[{}]: {}", key, column, intervals.len())];
    for interval in intervals {
        lines.push(format!("  {} .. {}", interval.start, interval.end));
    }
    finish(lines)
}

fn align(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:>width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Join lines and end with a newline
fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
