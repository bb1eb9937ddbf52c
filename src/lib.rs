//! Titlescan: a bulk page-title harvester
//!
//! This crate fetches large lists of URLs concurrently, extracts a representative
//! title for every page (first `<h1>`, falling back to `<title>`), and writes one
//! URL/Title report per input list. Fetching is bounded by a concurrency ceiling,
//! split into fixed-size chunks, and wrapped in a flat retry policy.

pub mod config;
pub mod crawler;
pub mod input;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-URL failures are never represented here; they are carried as
/// [`state::FetchError`] values inside each outcome.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Concurrency limiter closed: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while discovering and reading URL lists
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input folder not found: {}", .0.display())]
    MissingFolder(PathBuf),

    #[error("No TXT files found in {}", .0.display())]
    NoUrlFiles(PathBuf),

    #[error("No URLs found in any TXT file in {}", .0.display())]
    NoUrls(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl InputError {
    /// Returns true if the input simply holds nothing to fetch
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(
            self,
            InputError::MissingFolder(_) | InputError::NoUrlFiles(_) | InputError::NoUrls(_)
        )
    }
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for input operations
pub type InputResult<T> = std::result::Result<T, InputError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BatchRunner, Coordinator};
pub use state::{Bucket, FetchError, FetchOutcome, Tally, TallySnapshot, UrlState};
