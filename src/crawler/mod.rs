//! Crawler module for page fetching and batch processing
//!
//! This module contains the core fetching logic, including:
//! - HTTP fetching and response classification
//! - Title extraction from HTML
//! - Flat retry policy for transient failures
//! - Chunked, concurrency-bounded batch execution
//! - Per-file run coordination

mod coordinator;
mod fetcher;
mod parser;
mod retry;
mod runner;

pub use coordinator::{run_scan, Coordinator};
pub use fetcher::{
    build_http_client, fetch_page, HttpFetcher, HttpSessionFactory, PageFetcher, SessionFactory,
};
pub use parser::extract_title;
pub use retry::{fetch_with_retry, RetriedOutcome, RetryPolicy};
pub use runner::{BatchRunner, ChunkProgress};
