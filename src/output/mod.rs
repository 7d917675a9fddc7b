//! Output writers for ingested traces.
//!
//! This module is the boundary to the visualization front-ends:
//! - Report structures (series tables and burst intervals, with diagnostics)
//! - JSON report files
//! - Text summaries

pub mod json;
pub mod report;
pub mod text;

// Re-export main functions
pub use json::write_report;
pub use report::{build_report, burst_report, select_series, BurstReport, BurstRequest, Report};
pub use text::{format_bursts, format_metadata, format_table};
