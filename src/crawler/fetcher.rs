//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with a browser-like header set
//! - GET requests with a per-request deadline
//! - Response and transport error classification
//!
//! No retries happen here; see [`crate::crawler::retry`].

use crate::config::FetchConfig;
use crate::crawler::parser::extract_title;
use crate::state::{FetchError, FetchOutcome};
use crate::ScanError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

/// Performs a single fetch-and-extract attempt for one URL
///
/// Implementations never fail: every failure mode becomes a [`FetchOutcome`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Opens a fetcher session (one connection pool) for a chunk of URLs
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> Result<Arc<dyn PageFetcher>, ScanError>;
}

/// Builds an HTTP client with proper configuration
///
/// The idle pool is sized to the concurrency ceiling so a chunk never keeps
/// more connections per host than it can use at once.
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use titlescan::config::FetchConfig;
/// use titlescan::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

    let timeout = config.timeout();

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_max_idle_per_host(config.max_concurrent_requests)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and extracts its title
///
/// # Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 200, `<h1>` or `<title>` text | title |
/// | HTTP 200, neither | `NoTitleFound` |
/// | Any other status | `HttpStatus(code)` |
/// | Deadline exceeded | `Timeout` |
/// | Connection, DNS, TLS or body failure | `NetworkError(message)` |
///
/// The body is decoded as UTF-8; invalid sequences are replaced, never fatal.
pub async fn fetch_page(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return FetchOutcome::failure(url, classify_transport_error(&e)),
    };

    let status = response.status();
    if status != StatusCode::OK {
        tracing::trace!("{} answered HTTP {}", url, status.as_u16());
        return FetchOutcome::failure(url, FetchError::HttpStatus(status.as_u16()));
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return FetchOutcome::failure(url, classify_transport_error(&e)),
    };

    let html = String::from_utf8_lossy(&body);
    match extract_title(&html) {
        Some(title) => FetchOutcome::success(url, title),
        None => FetchOutcome::failure(url, FetchError::NoTitleFound),
    }
}

/// Maps a reqwest error onto the per-URL error taxonomy
fn classify_transport_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::NetworkError(error_chain_message(error))
    }
}

/// Joins an error and its sources into one line
///
/// reqwest's top-level message ("error sending request for url ...") hides the
/// useful part (DNS failure, connection refused) in its source chain.
fn error_chain_message(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// reqwest-backed [`PageFetcher`] bound to one client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        fetch_page(&self.client, url).await
    }
}

/// Opens a fresh reqwest client per session
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: FetchConfig,
}

impl HttpSessionFactory {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open_session(&self) -> Result<Arc<dyn PageFetcher>, ScanError> {
        let client = build_http_client(&self.config)?;
        Ok(Arc::new(HttpFetcher::new(client)))
    }
}
