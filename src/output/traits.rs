//! Report sink trait
//!
//! The coordinator hands each finished batch to a [`ReportSink`]. The default
//! sink writes CSV files; tests substitute their own.

use crate::output::report::write_report;
use crate::output::OutputResult;
use crate::state::FetchOutcome;
use std::path::PathBuf;

/// Consumer of one batch's outcomes
///
/// Implementations must be thread-safe.
pub trait ReportSink: Send + Sync {
    /// Persists the outcomes of the list named `stem`
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Where the report was written
    /// * `Err(OutputError)` - The report could not be written
    fn write(&self, stem: &str, outcomes: &[FetchOutcome]) -> OutputResult<PathBuf>;
}

/// Writes timestamped CSV reports into a folder
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    output_dir: PathBuf,
    max_write_attempts: u32,
}

impl CsvReportSink {
    pub fn new(output_dir: impl Into<PathBuf>, max_write_attempts: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_write_attempts,
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
}

impl ReportSink for CsvReportSink {
    fn write(&self, stem: &str, outcomes: &[FetchOutcome]) -> OutputResult<PathBuf> {
        write_report(&self.output_dir, stem, outcomes, self.max_write_attempts)
    }
}
