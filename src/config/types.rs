use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Browser-identifying user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Titlescan
///
/// Every field has a default, so an empty TOML document (or no file at all)
/// yields the stock settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub io: IoConfig,
}

/// Fetching, retry and batching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for a single request attempt (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum number of requests in flight within a chunk
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: usize,

    /// Number of URLs processed per chunk
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause before retrying after a timeout or transport failure (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Whether 4xx responses are retried like 5xx responses
    #[serde(rename = "retry-client-errors")]
    pub retry_client_errors: bool,

    /// User agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrent_requests: 50,
            chunk_size: 1000,
            max_attempts: 3,
            retry_delay_ms: 1000,
            retry_client_errors: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Input discovery and report output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Folder scanned for `*.txt` URL lists
    #[serde(rename = "input-dir")]
    pub input_dir: PathBuf,

    /// Folder receiving one report per URL list
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Attempts at a non-colliding report name before the TSV fallback
    #[serde(rename = "max-write-attempts")]
    pub max_write_attempts: u32,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output"),
            output_dir: PathBuf::from("URLTitles"),
            max_write_attempts: 3,
        }
    }
}
