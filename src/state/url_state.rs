//! Per-URL processing states
//!
//! `Pending -> Fetching -> {Success | RetryableFailure -> Fetching | TerminalFailure}`
use crate::state::{FetchError, FetchOutcome};
use std::fmt;

/// Represents where one URL is in its fetch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// Submitted but no attempt started yet
    Pending,

    /// An attempt is in flight
    Fetching,

    /// The last attempt failed and another one is allowed
    RetryableFailure,

    // ===== Terminal States =====
    /// A title was extracted
    Success,

    /// Non-retryable failure, or the attempt budget ran out
    TerminalFailure,
}

impl UrlState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::TerminalFailure)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Success)
                | (Self::Fetching, Self::RetryableFailure)
                | (Self::Fetching, Self::TerminalFailure)
                | (Self::RetryableFailure, Self::Fetching)
        )
    }

    /// State reached after an attempt produced `outcome`
    ///
    /// `retryable` says whether the retry policy will try again.
    pub fn after_attempt(outcome: &FetchOutcome, retryable: bool) -> Self {
        match &outcome.result {
            Ok(_) => Self::Success,
            Err(FetchError::NoTitleFound) => Self::TerminalFailure,
            Err(_) if retryable => Self::RetryableFailure,
            Err(_) => Self::TerminalFailure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::RetryableFailure => "retryable_failure",
            Self::Success => "success",
            Self::TerminalFailure => "terminal_failure",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
