//! Retry policy for page fetches
//!
//! | Outcome | Retried | Delay before next attempt |
//! |---------|---------|---------------------------|
//! | Title extracted | no | - |
//! | `NoTitleFound` | no | - |
//! | HTTP 400-499 | yes (unless `retry_client_errors` is off) | none |
//! | HTTP 500-599 | yes | none |
//! | Other status | no | - |
//! | `Timeout` | yes | `retry_delay` |
//! | `NetworkError` | yes | `retry_delay` |
//!
//! The delay is flat: it does not grow between attempts and has no jitter.

use crate::config::FetchConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::state::{FetchError, FetchOutcome, UrlState};
use std::time::Duration;

/// Decides whether and when a failed attempt is repeated
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per URL, including the first one
    pub max_attempts: u32,

    /// Pause after a timeout or transport failure
    pub retry_delay: Duration,

    /// Whether HTTP 4xx answers are retried
    pub retry_client_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            retry_client_errors: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            retry_client_errors: config.retry_client_errors,
        }
    }

    /// Returns true if this kind of failure is eligible for another attempt
    pub fn is_retryable(&self, error: &FetchError) -> bool {
        match error {
            FetchError::HttpStatus(code) if (400..500).contains(code) => self.retry_client_errors,
            FetchError::HttpStatus(code) => (500..600).contains(code),
            FetchError::Timeout | FetchError::NetworkError(_) => true,
            FetchError::NoTitleFound => false,
        }
    }

    /// Returns true if another attempt is allowed after `attempts` attempts
    pub fn has_budget(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Pause before retrying after `error`
    ///
    /// Status-code failures retry immediately.
    pub fn delay_after(&self, error: &FetchError) -> Duration {
        if error.is_transport() {
            self.retry_delay
        } else {
            Duration::ZERO
        }
    }
}

/// Terminal outcome of one URL plus the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriedOutcome {
    pub outcome: FetchOutcome,
    pub attempts: u32,
}

/// Fetches `url` until it succeeds, fails terminally, or runs out of attempts
///
/// The last observed outcome is returned when the budget is exhausted. This
/// function never fails.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
) -> RetriedOutcome {
    let mut state = UrlState::Pending;
    let mut attempts = 0;

    loop {
        attempts += 1;
        state = advance(url, state, UrlState::Fetching);

        let outcome = fetcher.fetch(url).await;

        let retry = outcome
            .error()
            .map(|error| policy.is_retryable(error) && policy.has_budget(attempts))
            .unwrap_or(false);
        state = advance(url, state, UrlState::after_attempt(&outcome, retry));

        if state.is_terminal() {
            if attempts > 1 {
                tracing::debug!(
                    "{} finished as {} after {} attempts",
                    url,
                    state,
                    attempts
                );
            }
            return RetriedOutcome { outcome, attempts };
        }

        if let Some(error) = outcome.error() {
            let delay = policy.delay_after(error);
            tracing::debug!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempts,
                policy.max_attempts,
                url,
                error,
                delay
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn advance(url: &str, from: UrlState, to: UrlState) -> UrlState {
    debug_assert!(
        from.can_transition_to(to),
        "invalid transition {} -> {} for {}",
        from,
        to,
        url
    );
    tracing::trace!("{}: {} -> {}", url, from, to);
    to
}
