//! Backoff-aware request runner.
//!
//! [`BackoffFetcher`] bounds how long a caller waits on one upstream request
//! and opens a backoff window for the whole provider when the upstream
//! answers HTTP 429. While the window is open no request should be made.
//!
//! Requests run on a detached task. The caller stops waiting at the timeout,
//! but the request itself keeps going and its completion callback still runs,
//! so a late answer can refresh the cache for the next caller.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a caller waits on a foreground request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// How long a provider stays quiet after an HTTP 429.
pub const DEFAULT_BACKOFF_WINDOW: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why an upstream request produced no value.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The upstream answered HTTP 429.
    #[error("Rate limited by upstream")]
    RateLimited,

    /// The caller stopped waiting.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream returned a non-2xx status other than 429.
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// The body did not have the expected shape.
    #[error("Malformed upstream payload: {0}")]
    Decode(String),

    /// The upstream has no data for this entity.
    #[error("Unsupported entity: {0}")]
    Unsupported(String),

    /// The request task panicked or was cancelled.
    #[error("Request task aborted: {0}")]
    Aborted(String),
}

// ---------------------------------------------------------------------------
// BackoffFetcher
// ---------------------------------------------------------------------------

/// Runs requests for one provider and tracks that provider's backoff window.
#[derive(Debug)]
pub struct BackoffFetcher {
    provider: &'static str,
    timeout: Duration,
    backoff_window: Duration,
    backoff_until: Mutex<Option<Instant>>,
}

impl BackoffFetcher {
    pub fn new(provider: &'static str, timeout: Duration, backoff_window: Duration) -> Self {
        Self {
            provider,
            timeout,
            backoff_window,
            backoff_until: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left in the backoff window, or `None` when requests are allowed.
    pub fn backoff_remaining(&self) -> Option<Duration> {
        let until = (*self.backoff_until.lock().unwrap_or_else(PoisonError::into_inner))?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    pub fn in_backoff(&self) -> bool {
        self.backoff_remaining().is_some()
    }

    /// Open the backoff window starting now.
    pub fn trip_backoff(&self) {
        let until = Instant::now() + self.backoff_window;
        *self.backoff_until.lock().unwrap_or_else(PoisonError::into_inner) = Some(until);
        tracing::warn!(
            provider = self.provider,
            backoff_secs = self.backoff_window.as_secs(),
            "Upstream rate limit hit, backing off"
        );
    }

    /// Drive `request` to completion, opening the backoff window on 429.
    pub async fn run<T, Fut>(&self, request: Fut) -> Result<T, FetchError>
    where
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let result = request.await;
        if matches!(result, Err(FetchError::RateLimited)) {
            self.trip_backoff();
        }
        result
    }

    /// Run `request` on a detached task and wait at most [`timeout`](Self::timeout).
    ///
    /// `on_complete` runs inside the task once the request finishes, whether
    /// or not the caller is still waiting.
    pub async fn fetch<T, Fut, C>(self: &Arc<Self>, request: Fut, on_complete: C) -> Result<T, FetchError>
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        C: FnOnce(&Result<T, FetchError>) + Send + 'static,
    {
        let handle = self.spawn(request, on_complete);
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(FetchError::Aborted(join_err.to_string())),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    /// Run `request` on a detached task without waiting for it.
    pub fn spawn_detached<T, Fut, C>(self: &Arc<Self>, request: Fut, on_complete: C)
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        C: FnOnce(&Result<T, FetchError>) + Send + 'static,
    {
        drop(self.spawn(request, on_complete));
    }

    fn spawn<T, Fut, C>(self: &Arc<Self>, request: Fut, on_complete: C) -> JoinHandle<Result<T, FetchError>>
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        C: FnOnce(&Result<T, FetchError>) + Send + 'static,
    {
        let fetcher = Arc::clone(self);
        tokio::spawn(async move {
            let result = fetcher.run(request).await;
            on_complete(&result);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    fn fetcher() -> Arc<BackoffFetcher> {
        Arc::new(BackoffFetcher::new(
            "test",
            Duration::from_secs(2),
            DEFAULT_BACKOFF_WINDOW,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn success_passes_value_through() {
        let f = fetcher();
        let result = f.fetch(async { Ok::<_, FetchError>(42) }, |_| {}).await;
        assert_matches!(result, Ok(42));
        assert!(!f.in_backoff());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_opens_backoff_window() {
        let f = fetcher();
        let result = f
            .fetch(async { Err::<u32, _>(FetchError::RateLimited) }, |_| {})
            .await;
        assert_matches!(result, Err(FetchError::RateLimited));
        assert!(f.in_backoff());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(f.in_backoff());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!f.in_backoff());
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_do_not_back_off() {
        let f = fetcher();
        let result = f.fetch(async { Err::<u32, _>(FetchError::Status(503)) }, |_| {}).await;
        assert_matches!(result, Err(FetchError::Status(503)));
        assert!(!f.in_backoff());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_times_out_but_still_completes() {
        let f = fetcher();
        let completed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&completed);

        let result = f
            .fetch(
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<_, FetchError>(7)
                },
                move |r| flag.store(r.is_ok(), Ordering::SeqCst),
            )
            .await;
        assert_matches!(result, Err(FetchError::Timeout(_)));
        assert!(!completed.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(completed.load(Ordering::SeqCst));
    }
}
