//! Run statistics
//!
//! This module collects per-file results of a run and renders them for the
//! operator once all input lists are processed.

use crate::state::TallySnapshot;
use std::path::PathBuf;
use std::time::Duration;

/// Result of processing one input list
#[derive(Debug, Clone)]
pub struct FileSummary {
    /// Input file name
    pub name: String,

    /// URLs read from the file
    pub urls: usize,

    /// Outcomes produced (equals `urls` unless the batch was aborted)
    pub outcomes: usize,

    /// Final tally for this file
    pub tally: TallySnapshot,

    /// Where the report went, or why it could not be written
    pub report: Result<PathBuf, String>,

    /// Wall-clock time spent on this file
    pub elapsed: Duration,
}

impl FileSummary {
    pub fn success_rate(&self) -> f64 {
        if self.outcomes == 0 {
            0.0
        } else {
            (self.tally.success as f64 / self.outcomes as f64) * 100.0
        }
    }
}

/// Result of a whole run over an input folder
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files that were fetched, in processing order
    pub files: Vec<FileSummary>,

    /// Files skipped because they held no URLs
    pub skipped: Vec<String>,

    /// Read errors of files that could not be processed
    pub unreadable: Vec<String>,
}

impl RunSummary {
    pub fn total_urls(&self) -> usize {
        self.files.iter().map(|f| f.urls).sum()
    }

    /// Sum of every file's tally
    pub fn combined_tally(&self) -> TallySnapshot {
        self.files
            .iter()
            .fold(TallySnapshot::default(), |acc, f| TallySnapshot {
                success: acc.success + f.tally.success,
                client_error: acc.client_error + f.tally.client_error,
                server_error: acc.server_error + f.tally.server_error,
                other_error: acc.other_error + f.tally.other_error,
            })
    }

    /// Files whose report could not be written
    pub fn failed_reports(&self) -> usize {
        self.files.iter().filter(|f| f.report.is_err()).count()
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Titlescan Summary ===\n");

    for file in &summary.files {
        println!("{}:", file.name);
        println!("  URLs processed: {}/{}", file.outcomes, file.urls);
        println!(
            "  Success: {} ({:.1}%)",
            file.tally.success,
            file.success_rate()
        );
        println!("  Client errors (4xx): {}", file.tally.client_error);
        println!("  Server errors (5xx): {}", file.tally.server_error);
        println!("  Other errors: {}", file.tally.other_error);
        match &file.report {
            Ok(path) => println!("  Report: {}", path.display()),
            Err(e) => println!("  Report: FAILED ({})", e),
        }
        println!("  Time: {:.2}s", file.elapsed.as_secs_f64());
        println!();
    }

    if !summary.skipped.is_empty() {
        println!("Skipped empty files:");
        for name in &summary.skipped {
            println!("  - {}", name);
        }
        println!();
    }

    if !summary.unreadable.is_empty() {
        println!("Unreadable files:");
        for error in &summary.unreadable {
            println!("  - {}", error);
        }
        println!();
    }

    let combined = summary.combined_tally();
    println!("Overall:");
    println!("  Files: {}", summary.files.len());
    println!("  URLs: {}", summary.total_urls());
    println!("  {}", combined);
    if summary.failed_reports() > 0 {
        println!("  Reports not written: {}", summary.failed_reports());
    }
}
