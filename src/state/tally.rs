//! Outcome classification and running tallies
//!
//! Every terminal outcome lands in exactly one [`Bucket`]. A [`Tally`] is shared
//! by all tasks of a batch through an `Arc` and updated with atomic increments.

use crate::state::{FetchError, FetchOutcome};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Classification bucket for a terminal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// A title was extracted
    Success,

    /// HTTP 400-499
    ClientError,

    /// HTTP 500-599
    ServerError,

    /// Timeouts, transport failures, pages without a title, other statuses
    OtherError,
}

impl Bucket {
    /// Classifies an outcome
    ///
    /// Pure function of the outcome's kind and status code.
    pub fn classify(outcome: &FetchOutcome) -> Self {
        match &outcome.result {
            Ok(_) => Self::Success,
            Err(FetchError::HttpStatus(code)) if (400..500).contains(code) => Self::ClientError,
            Err(FetchError::HttpStatus(code)) if (500..600).contains(code) => Self::ServerError,
            Err(_) => Self::OtherError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::OtherError => "other_error",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live counters for one batch run
#[derive(Debug, Default)]
pub struct Tally {
    success: AtomicU64,
    client_error: AtomicU64,
    server_error: AtomicU64,
    other_error: AtomicU64,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the outcome and increments its counter by one
    pub fn record(&self, outcome: &FetchOutcome) -> Bucket {
        let bucket = Bucket::classify(outcome);
        self.counter(bucket).fetch_add(1, Ordering::Relaxed);
        bucket
    }

    /// Returns a point-in-time copy of the counters
    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            success: self.success.load(Ordering::Relaxed),
            client_error: self.client_error.load(Ordering::Relaxed),
            server_error: self.server_error.load(Ordering::Relaxed),
            other_error: self.other_error.load(Ordering::Relaxed),
        }
    }

    /// Zeroes all counters
    pub fn reset(&self) {
        for bucket in [
            Bucket::Success,
            Bucket::ClientError,
            Bucket::ServerError,
            Bucket::OtherError,
        ] {
            self.counter(bucket).store(0, Ordering::Relaxed);
        }
    }

    fn counter(&self, bucket: Bucket) -> &AtomicU64 {
        match bucket {
            Bucket::Success => &self.success,
            Bucket::ClientError => &self.client_error,
            Bucket::ServerError => &self.server_error,
            Bucket::OtherError => &self.other_error,
        }
    }
}

/// Copy of the tally counters at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    pub success: u64,
    pub client_error: u64,
    pub server_error: u64,
    pub other_error: u64,
}

impl TallySnapshot {
    pub fn total(&self) -> u64 {
        self.success + self.client_error + self.server_error + self.other_error
    }

    pub fn errors(&self) -> u64 {
        self.client_error + self.server_error + self.other_error
    }
}

impl fmt::Display for TallySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} client_error={} server_error={} other_error={}",
            self.success, self.client_error, self.server_error, self.other_error
        )
    }
}
