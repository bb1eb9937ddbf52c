//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchOutcome` / `FetchError`: the terminal result of one URL
//! - `UrlState`: lifecycle of a single URL through the retry loop
//! - `Tally` / `Bucket`: outcome classification and live counters for a batch

mod outcome;
mod tally;
mod url_state;

// Re-export main types
pub use outcome::{FetchError, FetchOutcome};
pub use tally::{Bucket, Tally, TallySnapshot};
pub use url_state::UrlState;
