//! CLI command implementations and the ingestion pipeline they drive.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod ingest;
pub mod utils;

// Re-export main command functions
pub use analyze::{execute_analyze, render_summary, resolve_config, validate_args, AnalyzeArgs};
pub use ingest::{ingest_path, ingest_reader, IngestStats, Trace};
pub use utils::{describe_policy, display_policies, display_version};
