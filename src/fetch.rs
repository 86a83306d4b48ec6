//! HTTP GET with exponential backoff retry logic.
//!
//! The page and image collaborators both load resources through this module.
//!
//! - [`FetchAsync`]: core trait for an async fetch of one URL
//! - [`HttpGet`]: plain `reqwest` GET returning the body bytes
//! - [`RetryFetch`]: decorator that adds retries to any `FetchAsync`
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use rand::{Rng, rng};
use reqwest::Client;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};
use url::Url;

use crate::error::{Error, Result};

/// Trait for fetching a single URL.
pub trait FetchAsync {
    type Response;

    async fn fetch(&self, url: &Url) -> Result<Self::Response>;
}

/// Retry parameters shared by every collaborator in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    pub base_delay: StdDuration,
    /// Cap on a single delay, before jitter.
    pub max_delay: StdDuration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: StdDuration::from_millis(500),
            max_delay: StdDuration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

/// GET returning the response body; non-2xx statuses are errors.
#[derive(Debug, Clone)]
pub struct HttpGet {
    client: Client,
}

impl HttpGet {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl FetchAsync for HttpGet {
    type Response = Vec<u8>;

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Self::Response> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`].
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.policy.max_retries)
            .field("base_delay", &self.policy.base_delay)
            .field("max_delay", &self.policy.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Self::Response> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.policy.max_retries {
                        error!(
                            attempt,
                            max = self.policy.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.policy.backoff(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FetchAsync for Flaky {
        type Response = &'static str;

        async fn fetch(&self, _url: &Url) -> Result<Self::Response> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(Error::Scraping(format!("failure {n}")))
            } else {
                Ok("ok")
            }
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: StdDuration::from_millis(1),
            max_delay: StdDuration::from_millis(2),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), StdDuration::from_secs(1));
        assert_eq!(policy.backoff(2), StdDuration::from_secs(2));
        assert_eq!(policy.backoff(3), StdDuration::from_secs(4));
        assert_eq!(policy.backoff(4), StdDuration::from_secs(5));
        assert_eq!(policy.backoff(64), StdDuration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let url = Url::parse("https://site.example/").unwrap();
        let retry = RetryFetch::new(
            Flaky {
                failures: 2,
                calls: AtomicUsize::new(0),
            },
            fast_policy(3),
        );
        assert_eq!(retry.fetch(&url).await.unwrap(), "ok");
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let url = Url::parse("https://site.example/").unwrap();
        let retry = RetryFetch::new(
            Flaky {
                failures: 10,
                calls: AtomicUsize::new(0),
            },
            fast_policy(2),
        );
        assert!(retry.fetch(&url).await.is_err());
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_http_get_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();

        let err = HttpGet::new(Client::new()).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
        mock.assert_async().await;
    }
}
