//! Per-URL fetch outcomes
//!
//! An outcome is the terminal result of fetching one URL. Failures are data,
//! not Rust errors: the fetcher and retry layers always produce a value.

use std::fmt;

/// Reason a URL did not yield a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a status other than 200
    HttpStatus(u16),

    /// The request did not complete before its deadline
    Timeout,

    /// Connection, DNS, TLS or body transfer failure
    NetworkError(String),

    /// The page was fetched but has no non-empty `<h1>` or `<title>`
    NoTitleFound,
}

impl FetchError {
    /// Returns true for transport-level failures (as opposed to an HTTP answer)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "Timeout"),
            Self::NetworkError(message) => write!(f, "{}", message),
            Self::NoTitleFound => write!(f, "No title found"),
        }
    }
}

/// Result of attempting to retrieve and parse one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The original input URL, unmodified
    pub url: String,

    /// Extracted title, or the reason there is none
    pub result: Result<String, FetchError>,
}

impl FetchOutcome {
    pub fn success(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            result: Ok(title.into()),
        }
    }

    pub fn failure(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            result: Err(error),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.result.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
