//! Bounded batch runner
//!
//! This module drives a URL list through the fetcher and retry policy:
//! - The list is split into contiguous chunks of at most `chunk_size` URLs
//! - Each chunk gets a fresh fetcher session (connection pool)
//! - Within a chunk, a semaphore caps in-flight fetches at `concurrency`
//! - A chunk finishes completely before the next one starts
//!
//! Outcomes within a chunk are collected in completion order; chunks are
//! appended in submission order.

use crate::config::FetchConfig;
use crate::crawler::fetcher::SessionFactory;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::state::{FetchError, FetchOutcome, Tally, TallySnapshot};
use crate::ScanError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Progress report emitted after each chunk completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkProgress {
    /// 1-based index of the chunk that just finished
    pub chunk_index: usize,

    /// Number of chunks in the batch
    pub chunk_count: usize,

    /// URLs with a terminal outcome so far
    pub processed: usize,

    /// URLs in the batch
    pub total: usize,

    /// Tally counters after this chunk
    pub tally: TallySnapshot,
}

impl ChunkProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f64 / self.total as f64) * 100.0
        }
    }
}

/// Runs URL batches under a concurrency ceiling
pub struct BatchRunner<F: SessionFactory> {
    factory: F,
    concurrency: usize,
    chunk_size: usize,
    policy: RetryPolicy,
}

impl<F: SessionFactory> BatchRunner<F> {
    /// Creates a new runner
    ///
    /// `concurrency` and `chunk_size` are clamped to at least 1.
    pub fn new(factory: F, concurrency: usize, chunk_size: usize, policy: RetryPolicy) -> Self {
        Self {
            factory,
            concurrency: concurrency.max(1),
            chunk_size: chunk_size.max(1),
            policy,
        }
    }

    pub fn from_config(factory: F, config: &FetchConfig) -> Self {
        Self::new(
            factory,
            config.max_concurrent_requests,
            config.chunk_size,
            RetryPolicy::from_config(config),
        )
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Processes every URL and returns one outcome per URL
    pub async fn run(
        &self,
        urls: &[String],
        tally: &Arc<Tally>,
    ) -> Result<Vec<FetchOutcome>, ScanError> {
        self.run_with_progress(urls, tally, |_| {}).await
    }

    /// Processes every URL, calling `on_progress` after each chunk
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<FetchOutcome>)` - Exactly one outcome per input URL, even
    ///   when a chunk's session could not be opened: those URLs get
    ///   `NetworkError("session setup failed: ...")` and later chunks still run
    /// * `Err(ScanError::Semaphore)` - The concurrency limiter was closed
    pub async fn run_with_progress<P>(
        &self,
        urls: &[String],
        tally: &Arc<Tally>,
        mut on_progress: P,
    ) -> Result<Vec<FetchOutcome>, ScanError>
    where
        P: FnMut(&ChunkProgress),
    {
        let total = urls.len();
        let chunk_count = total.div_ceil(self.chunk_size);
        let mut outcomes = Vec::with_capacity(total);

        for (index, chunk) in urls.chunks(self.chunk_size).enumerate() {
            tracing::debug!(
                "Starting chunk {}/{} ({} URLs)",
                index + 1,
                chunk_count,
                chunk.len()
            );

            let chunk_outcomes = self.run_chunk(chunk, tally).await?;
            outcomes.extend(chunk_outcomes);

            let progress = ChunkProgress {
                chunk_index: index + 1,
                chunk_count,
                processed: outcomes.len(),
                total,
                tally: tally.snapshot(),
            };
            tracing::info!(
                "Progress: {}/{} URLs ({:.1}%), chunk {}/{}, {}",
                progress.processed,
                progress.total,
                progress.percent(),
                progress.chunk_index,
                progress.chunk_count,
                progress.tally
            );
            on_progress(&progress);
        }

        Ok(outcomes)
    }

    /// Processes one chunk with a fresh session
    async fn run_chunk(
        &self,
        chunk: &[String],
        tally: &Arc<Tally>,
    ) -> Result<Vec<FetchOutcome>, ScanError> {
        let fetcher = match self.factory.open_session() {
            Ok(fetcher) => fetcher,
            Err(e) => {
                tracing::error!("Could not open a session for {} URLs: {}", chunk.len(), e);
                return Ok(fail_all(chunk, tally, &format!("session setup failed: {}", e)));
            }
        };
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, url) in chunk.iter().enumerate() {
            // Acquired before spawning so no more than `concurrency` tasks exist at once
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let fetcher = Arc::clone(&fetcher);
            let policy = self.policy.clone();
            let tally = Arc::clone(tally);
            let url = url.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let retried = fetch_with_retry(fetcher.as_ref(), &url, &policy).await;
                tally.record(&retried.outcome);
                (index, retried.outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(chunk.len());
        let mut finished = vec![false; chunk.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    finished[index] = true;
                    outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::error!("Fetch task failed: {}", e);
                }
            }
        }

        // A task that panicked still owes its URL an outcome
        let orphaned: Vec<String> = chunk
            .iter()
            .zip(&finished)
            .filter(|(_, done)| !**done)
            .map(|(url, _)| url.clone())
            .collect();
        outcomes.extend(fail_all(&orphaned, tally, "task failed"));

        Ok(outcomes)
    }
}

/// Records a `NetworkError` outcome for every URL in `urls`
fn fail_all(urls: &[String], tally: &Tally, message: &str) -> Vec<FetchOutcome> {
    urls.iter()
        .map(|url| {
            let error = FetchError::NetworkError(message.to_string());
            let outcome = FetchOutcome::failure(url.as_str(), error);
            tally.record(&outcome);
            outcome
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::PageFetcher;
    use crate::state::Bucket;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers by URL suffix and records the peak number of concurrent calls
    #[derive(Default)]
    struct ProbeFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for ProbeFetcher {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("/404") {
                FetchOutcome::failure(url, FetchError::HttpStatus(404))
            } else if url.ends_with("/503") {
                FetchOutcome::failure(url, FetchError::HttpStatus(503))
            } else if url.ends_with("/empty") {
                FetchOutcome::failure(url, FetchError::NoTitleFound)
            } else if url.ends_with("/panic") {
                panic!("probe asked to panic");
            } else {
                FetchOutcome::success(url, format!("Title of {}", url))
            }
        }
    }

    /// Hands out one shared probe and counts sessions
    #[derive(Default)]
    struct ProbeFactory {
        probe: Arc<ProbeFetcher>,
        sessions: AtomicUsize,
    }

    impl SessionFactory for ProbeFactory {
        fn open_session(&self) -> Result<Arc<dyn PageFetcher>, ScanError> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(self.probe.clone())
        }
    }

    fn urls(paths: &[&str]) -> Vec<String> {
        paths
            .iter()
            .map(|p| format!("https://example.com{}", p))
            .collect()
    }

    fn numbered_urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("https://example.com/page/{}", i))
            .collect()
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(1),
            retry_client_errors: true,
        }
    }

    #[tokio::test]
    async fn test_one_outcome_per_url() {
        let runner = BatchRunner::new(ProbeFactory::default(), 8, 10, fast_policy());
        let tally = Arc::new(Tally::new());
        let input = numbered_urls(57);

        let outcomes = runner.run(&input, &tally).await.unwrap();

        assert_eq!(outcomes.len(), input.len());
        let seen: HashSet<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        let expected: HashSet<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let factory = ProbeFactory::default();
        let runner = BatchRunner::new(factory, 4, 10, fast_policy());
        let tally = Arc::new(Tally::new());

        let outcomes = runner.run(&[], &tally).await.unwrap();

        assert!(outcomes.is_empty());
        assert_eq!(tally.snapshot().total(), 0);
        assert_eq!(runner.factory.sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_ceiling_respected() {
        let runner = BatchRunner::new(ProbeFactory::default(), 5, 100, fast_policy());
        let tally = Arc::new(Tally::new());

        runner.run(&numbered_urls(60), &tally).await.unwrap();

        let peak = runner.factory.probe.peak.load(Ordering::SeqCst);
        assert!(peak <= 5, "peak in-flight {} exceeded ceiling", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_fresh_session_per_chunk() {
        let runner = BatchRunner::new(ProbeFactory::default(), 4, 10, fast_policy());
        let tally = Arc::new(Tally::new());

        runner.run(&numbered_urls(25), &tally).await.unwrap();

        assert_eq!(runner.factory.sessions.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_chunks_complete_in_order() {
        let runner = BatchRunner::new(ProbeFactory::default(), 3, 4, fast_policy());
        let tally = Arc::new(Tally::new());
        let input = numbered_urls(12);

        let outcomes = runner.run(&input, &tally).await.unwrap();

        // Each block of 4 outcomes belongs to the matching block of 4 inputs
        for (chunk_in, chunk_out) in input.chunks(4).zip(outcomes.chunks(4)) {
            let expected: HashSet<&str> = chunk_in.iter().map(String::as_str).collect();
            let actual: HashSet<&str> = chunk_out.iter().map(|o| o.url.as_str()).collect();
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn test_tally_matches_outcomes() {
        let runner = BatchRunner::new(ProbeFactory::default(), 4, 3, fast_policy());
        let tally = Arc::new(Tally::new());
        let input = urls(&["/a", "/404", "/503", "/empty", "/b", "/c", "/404"]);

        let outcomes = runner.run(&input, &tally).await.unwrap();
        let snapshot = tally.snapshot();

        assert_eq!(snapshot.total(), input.len() as u64);
        assert_eq!(snapshot.success, 3);
        assert_eq!(snapshot.client_error, 2);
        assert_eq!(snapshot.server_error, 1);
        assert_eq!(snapshot.other_error, 1);

        let successes = outcomes
            .iter()
            .filter(|o| Bucket::classify(o) == Bucket::Success)
            .count();
        assert_eq!(successes as u64, snapshot.success);
    }

    #[tokio::test]
    async fn test_retryable_failures_use_full_budget() {
        let runner = BatchRunner::new(ProbeFactory::default(), 4, 10, fast_policy());
        let tally = Arc::new(Tally::new());

        runner.run(&urls(&["/503", "/404", "/ok"]), &tally).await.unwrap();

        // 3 + 3 + 1 calls
        assert_eq!(runner.factory.probe.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_progress_reported_per_chunk() {
        let runner = BatchRunner::new(ProbeFactory::default(), 4, 10, fast_policy());
        let tally = Arc::new(Tally::new());
        let mut reports = Vec::new();

        runner
            .run_with_progress(&numbered_urls(25), &tally, |p| reports.push(p.clone()))
            .await
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports.iter().map(|p| p.processed).collect::<Vec<_>>(),
            vec![10, 20, 25]
        );
        assert!(reports.iter().all(|p| p.chunk_count == 3 && p.total == 25));
        assert_eq!(reports[2].tally.total(), 25);
        assert_eq!(reports[2].percent(), 100.0);
    }

    #[tokio::test]
    async fn test_panicking_task_still_yields_outcome() {
        let runner = BatchRunner::new(ProbeFactory::default(), 2, 10, fast_policy());
        let tally = Arc::new(Tally::new());
        let input = urls(&["/a", "/panic", "/b"]);

        let outcomes = runner.run(&input, &tally).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        let failed = outcomes
            .iter()
            .find(|o| o.url.ends_with("/panic"))
            .unwrap();
        assert!(matches!(failed.result, Err(FetchError::NetworkError(_))));
        assert_eq!(tally.snapshot().total(), 3);
        assert_eq!(tally.snapshot().other_error, 1);
    }

    struct BrokenFactory;

    impl SessionFactory for BrokenFactory {
        fn open_session(&self) -> Result<Arc<dyn PageFetcher>, ScanError> {
            Err(ScanError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no sockets left",
            )))
        }
    }

    #[tokio::test]
    async fn test_session_failure_keeps_every_url() {
        let runner = BatchRunner::new(BrokenFactory, 4, 2, fast_policy());
        let tally = Arc::new(Tally::new());

        let outcomes = runner.run(&numbered_urls(5), &tally).await.unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| matches!(
            &o.result,
            Err(FetchError::NetworkError(m)) if m.contains("no sockets left")
        )));
        assert_eq!(tally.snapshot().other_error, 5);
    }

    /// Fails to open the first session only
    #[derive(Default)]
    struct FirstSessionFails {
        opened: AtomicUsize,
    }

    impl SessionFactory for FirstSessionFails {
        fn open_session(&self) -> Result<Arc<dyn PageFetcher>, ScanError> {
            if self.opened.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ScanError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "pool exhausted",
                )));
            }
            Ok(Arc::new(ProbeFetcher::default()))
        }
    }

    #[tokio::test]
    async fn test_later_chunks_run_after_session_failure() {
        let runner = BatchRunner::new(FirstSessionFails::default(), 4, 2, fast_policy());
        let tally = Arc::new(Tally::new());

        let outcomes = runner.run(&numbered_urls(5), &tally).await.unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[..2].iter().all(|o| matches!(
            &o.result,
            Err(FetchError::NetworkError(m)) if m.starts_with("session setup failed")
        )));
        assert!(outcomes[2..].iter().all(FetchOutcome::is_success));
        assert_eq!(tally.snapshot().other_error, 2);
        assert_eq!(tally.snapshot().success, 3);
    }

    #[test]
    fn test_new_clamps_zero_settings() {
        let runner = BatchRunner::new(ProbeFactory::default(), 0, 0, fast_policy());
        assert_eq!(runner.concurrency(), 1);
        assert_eq!(runner.chunk_size(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = FetchConfig {
            max_concurrent_requests: 7,
            chunk_size: 70,
            ..FetchConfig::default()
        };
        let runner = BatchRunner::from_config(ProbeFactory::default(), &config);
        assert_eq!(runner.concurrency(), 7);
        assert_eq!(runner.chunk_size(), 70);
    }
}
