//! Aggregation of extracted rows into series tables and burst intervals.
//!
//! This module transforms extracted rows into:
//! - Deduplicated, time-indexed tables (one per series key)
//! - Contiguous-run intervals over counter columns

pub mod pivot;
pub mod runs;

// Re-export main types and functions
pub use pivot::{pivot, SeriesBuilder, SeriesTable, TableRow};
pub use runs::{detect_runs, RunInterval};
