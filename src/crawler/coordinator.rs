//! Run coordinator - per-file orchestration
//!
//! This module ties the pieces together for one run over an input folder:
//! - Creating the output folder
//! - Discovering URL lists
//! - Running each list through the batch runner with a fresh tally
//! - Handing each batch to the report sink
//!
//! A failure to write one report is logged and never stops later files.

use crate::config::Config;
use crate::crawler::fetcher::{HttpSessionFactory, SessionFactory};
use crate::crawler::runner::BatchRunner;
use crate::input::{read_url_lists, UrlList};
use crate::output::{ensure_output_dir, CsvReportSink, FileSummary, ReportSink, RunSummary};
use crate::state::Tally;
use crate::{InputError, ScanError};
use std::sync::Arc;
use std::time::Instant;

/// Main run coordinator structure
pub struct Coordinator<F: SessionFactory = HttpSessionFactory, S: ReportSink = CsvReportSink> {
    config: Config,
    runner: BatchRunner<F>,
    sink: S,
    tally: Arc<Tally>,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP and writes CSV reports
    pub fn new(config: Config) -> Self {
        let factory = HttpSessionFactory::new(config.fetch.clone());
        let sink = CsvReportSink::new(config.io.output_dir.clone(), config.io.max_write_attempts);
        Self::with_parts(config, factory, sink)
    }
}

impl<F: SessionFactory, S: ReportSink> Coordinator<F, S> {
    /// Creates a coordinator with a custom session factory and report sink
    pub fn with_parts(config: Config, factory: F, sink: S) -> Self {
        let runner = BatchRunner::from_config(factory, &config.fetch);
        Self {
            config,
            runner,
            sink,
            tally: Arc::new(Tally::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes every URL list in the input folder
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Every non-empty list was fetched (reports may have failed)
    /// * `Err(ScanError::Input)` - Input folder missing, no lists, no URLs at all,
    ///   or no list could be read
    /// * `Err(ScanError::Output)` - The output folder could not be created
    pub async fn run(&self) -> Result<RunSummary, ScanError> {
        let output_dir = &self.config.io.output_dir;
        if ensure_output_dir(output_dir)? {
            tracing::info!("Created output folder {}", output_dir.display());
        } else {
            tracing::info!("Output folder {} already exists", output_dir.display());
        }

        let input_dir = &self.config.io.input_dir;
        let discovered = read_url_lists(input_dir)?;
        let lists = discovered.lists;
        if lists.iter().all(|list| list.urls.is_empty()) {
            return Err(InputError::NoUrls(input_dir.clone()).into());
        }

        let total_files = lists.len();
        tracing::info!("Found {} TXT files to process", total_files);

        let mut summary = RunSummary {
            unreadable: discovered.unreadable.iter().map(|e| e.to_string()).collect(),
            ..RunSummary::default()
        };
        for (index, list) in lists.iter().enumerate() {
            if list.urls.is_empty() {
                tracing::warn!("Skipping empty file: {}", list.name);
                summary.skipped.push(list.name.clone());
                continue;
            }

            tracing::info!(
                "Working on file {}/{}: {} ({} URLs)",
                index + 1,
                total_files,
                list.name,
                list.urls.len()
            );
            summary.files.push(self.process_list(list).await?);
        }

        Ok(summary)
    }

    /// Fetches one list and writes its report
    async fn process_list(&self, list: &UrlList) -> Result<FileSummary, ScanError> {
        let start = Instant::now();
        self.tally.reset();

        let outcomes = self.runner.run(&list.urls, &self.tally).await?;
        let tally = self.tally.snapshot();

        let report = match self.sink.write(&list.stem, &outcomes) {
            Ok(path) => {
                tracing::info!("Titles saved to: {}", path.display());
                Ok(path)
            }
            Err(e) => {
                tracing::error!("Error saving report for {}: {}", list.name, e);
                Err(e.to_string())
            }
        };

        let elapsed = start.elapsed();
        tracing::info!(
            "Finished {} in {:.2}s: {} URLs processed, {}",
            list.name,
            elapsed.as_secs_f64(),
            outcomes.len(),
            tally
        );

        Ok(FileSummary {
            name: list.name.clone(),
            urls: list.urls.len(),
            outcomes: outcomes.len(),
            tally,
            report,
            elapsed,
        })
    }
}

/// Runs a complete pass over the configured input folder
///
/// # Example
///
/// ```no_run
/// use titlescan::config::Config;
/// use titlescan::crawler::run_scan;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_scan(Config::default()).await?;
/// println!("{} files processed", summary.files.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_scan(config: Config) -> Result<RunSummary, ScanError> {
    Coordinator::new(config).run().await
}
