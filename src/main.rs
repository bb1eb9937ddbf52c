//! Titlescan main entry point
//!
//! This is the command-line interface for the Titlescan bulk title harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use titlescan::config::{load_config_with_hash, validate, Config};
use titlescan::crawler::Coordinator;
use titlescan::input::read_url_lists;
use titlescan::output::print_run_summary;
use titlescan::ScanError;
use tracing_subscriber::EnvFilter;

/// Titlescan: a bulk page-title harvester
///
/// Titlescan reads every `*.txt` URL list in the input folder, fetches the
/// URLs concurrently, and writes one URL/Title report per list.
#[derive(Parser, Debug)]
#[command(name = "titlescan")]
#[command(version = "1.0.0")]
#[command(about = "A bulk page-title harvester", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Folder containing *.txt URL lists
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Folder receiving the reports
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of requests in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// URLs processed per chunk
    #[arg(long, value_name = "N")]
    chunk_size: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Attempts per URL, including the first
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and input files without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scan(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("titlescan=info,warn"),
            1 => EnvFilter::new("titlescan=debug,info"),
            2 => EnvFilter::new("titlescan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(input) = &cli.input {
        config.io.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.io.output_dir = output.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.fetch.max_concurrent_requests = concurrency;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.fetch.chunk_size = chunk_size;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_secs = timeout;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.fetch.max_attempts = max_attempts;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows settings and what would be fetched
fn handle_dry_run(config: &Config) {
    println!("=== Titlescan Dry Run ===\n");

    println!("Fetch Configuration:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Max concurrent requests: {}",
        config.fetch.max_concurrent_requests
    );
    println!("  Chunk size: {}", config.fetch.chunk_size);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);
    println!(
        "  Retry client errors: {}",
        config.fetch.retry_client_errors
    );

    println!("\nFolders:");
    println!("  Input: {}", config.io.input_dir.display());
    println!("  Output: {}", config.io.output_dir.display());

    match read_url_lists(&config.io.input_dir) {
        Ok(discovered) => {
            println!("\nURL Lists ({}):", discovered.lists.len());
            for list in &discovered.lists {
                println!("  - {} ({} URLs)", list.name, list.urls.len());
            }
            for error in &discovered.unreadable {
                println!("  ✗ {}", error);
            }
            println!(
                "\n✓ Would fetch {} URLs",
                discovered.lists.iter().map(|l| l.urls.len()).sum::<usize>()
            );
        }
        Err(e) => println!("\n✗ {}", e),
    }
}

/// Handles the main scan operation
async fn handle_scan(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Input: {}, output: {}, concurrency: {}, chunk size: {}",
        config.io.input_dir.display(),
        config.io.output_dir.display(),
        config.fetch.max_concurrent_requests,
        config.fetch.chunk_size
    );

    let coordinator = Coordinator::new(config);
    match coordinator.run().await {
        Ok(summary) => {
            print_run_summary(&summary);
            tracing::info!("All files processed");
            Ok(())
        }
        // Nothing to do is reported, not treated as a crash
        Err(ScanError::Input(e)) if e.is_nothing_to_do() => {
            tracing::error!("{}", e);
            Ok(())
        }
        Err(e) => Err(e).context("Scan failed"),
    }
}
