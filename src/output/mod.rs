//! Output module for reports and run summaries
//!
//! This module handles:
//! - Creating the output folder
//! - Writing one URL/Title report per input list
//! - Summarizing a run for the operator

mod report;
pub mod stats;
mod traits;

pub use report::{
    encode_title, report_base_name, write_csv, write_report, write_report_named, write_tsv,
    ReportRow, REPORT_HEADERS,
};
pub use stats::{print_run_summary, FileSummary, RunSummary};
pub use traits::{CsvReportSink, ReportSink};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Fallback report {} failed: {message}", path.display())]
    Fallback { path: PathBuf, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Creates the output folder if needed
///
/// # Returns
///
/// * `Ok(true)` - The folder was created
/// * `Ok(false)` - The folder already existed
pub fn ensure_output_dir(path: &Path) -> OutputResult<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    Ok(true)
}
