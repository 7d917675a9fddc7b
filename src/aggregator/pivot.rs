//! Deduplicate extracted rows and pivot them into time-indexed tables.
//!
//! Within one series, the first row seen at a timestamp wins and later
//! rows at the same timestamp are dropped (not merged). Columns are the
//! union of the keys of the surviving rows; a row without a column gets
//! [`Value::Missing`] in that cell.

use crate::extract::{ExtractedRow, SeriesKey};
use crate::parser::{Mapping, Timestamp, Value};
use crate::utils::error::SeriesError;
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Time-indexed, column-per-field table for one series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    key: SeriesKey,
    columns: Vec<String>,
    times: Vec<Timestamp>,
    cells: Vec<Vec<Value>>,
    duplicates_dropped: usize,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRow<'a> {
    pub time: Timestamp,
    pub cells: &'a [Value],
}

impl SeriesTable {
    fn from_rows(key: SeriesKey, rows: BTreeMap<Timestamp, Mapping>, duplicates_dropped: usize) -> Self {
        let columns: Vec<String> = rows
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut times = Vec::with_capacity(rows.len());
        let mut cells = Vec::with_capacity(rows.len());
        for (time, mut row) in rows {
            times.push(time);
            cells.push(
                columns
                    .iter()
                    .map(|c| row.remove(c).unwrap_or(Value::Missing))
                    .collect(),
            );
        }

        Self {
            key,
            columns,
            times,
            cells,
            duplicates_dropped,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Rows discarded because an earlier row had the same timestamp
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Rows in ascending time order
    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> + '_ {
        self.times
            .iter()
            .zip(&self.cells)
            .map(|(time, cells)| TableRow {
                time: *time,
                cells: cells.as_slice(),
            })
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell at `time` in `column`, if both exist
    pub fn get(&self, time: Timestamp, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        let row = self.times.binary_search(&time).ok()?;
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// `(time, value)` pairs of one column, missing cells included
    pub fn column(&self, column: &str) -> Option<Vec<(Timestamp, &Value)>> {
        let col = self.column_index(column)?;
        Some(self.rows().map(|row| (row.time, &row.cells[col])).collect())
    }

    /// Numeric view of one column with missing cells skipped
    ///
    /// # Errors
    /// * `SeriesError::UnknownColumn` - no such column
    /// * `SeriesError::NonNumeric` - a present cell is not a number
    pub fn numeric_points(&self, column: &str) -> Result<Vec<(Timestamp, f64)>, SeriesError> {
        let cells = self.column(column).ok_or_else(|| SeriesError::UnknownColumn {
            key: self.key.to_string(),
            column: column.to_string(),
        })?;

        let mut points = Vec::with_capacity(cells.len());
        for (time, value) in cells {
            if value.is_missing() {
                continue;
            }
            let number = value.as_f64().ok_or_else(|| SeriesError::NonNumeric {
                key: self.key.to_string(),
                column: column.to_string(),
                time: time.as_f64(),
            })?;
            points.push((time, number));
        }
        Ok(points)
    }
}

#[derive(Debug, Default)]
struct Group {
    rows: BTreeMap<Timestamp, Mapping>,
    duplicates: usize,
}

impl Group {
    fn insert(&mut self, time: Timestamp, row: Mapping) {
        match self.rows.entry(time) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => self.duplicates += 1,
        }
    }
}

/// Groups extracted rows by series key as they stream in
#[derive(Debug, Default)]
pub struct SeriesBuilder {
    groups: BTreeMap<SeriesKey, Group>,
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ExtractedRow) {
        self.groups.entry(row.key).or_default().insert(row.time, row.row);
    }

    /// Total rows dropped as timestamp duplicates so far
    pub fn duplicates_dropped(&self) -> usize {
        self.groups.values().map(|g| g.duplicates).sum()
    }

    pub fn finish(self) -> BTreeMap<SeriesKey, SeriesTable> {
        debug!("Pivoting {} series", self.groups.len());
        self.groups
            .into_iter()
            .map(|(key, group)| {
                let table = SeriesTable::from_rows(key.clone(), group.rows, group.duplicates);
                (key, table)
            })
            .collect()
    }
}

/// Pivot the rows of one series, in input order, into a table
pub fn pivot<I>(key: SeriesKey, rows: I) -> SeriesTable
where
    I: IntoIterator<Item = (Timestamp, Mapping)>,
{
    let mut group = Group::default();
    for (time, row) in rows {
        group.insert(time, row);
    }
    SeriesTable::from_rows(key, group.rows, group.duplicates)
}
