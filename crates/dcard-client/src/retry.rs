//! Backoff for collaborator calls.
//!
//! Only transport failures (refused connections, timeouts) are retried. A
//! response with any status is returned to the caller as-is.

use std::future::Future;
use std::time::Duration;

/// Exponential backoff schedule: `base`, `2 * base`, `4 * base`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub retries: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    /// Three retries after 200, 400, and 800 ms.
    fn default() -> Self {
        Self {
            retries: 3,
            base: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, retry: u32) -> Duration {
        self.base.saturating_mul(1u32 << retry.min(16))
    }

    /// Run `send` until it yields a response or the retries run out.
    pub async fn send<F, Fut>(&self, endpoint: &str, send: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut retry = 0;
        loop {
            let err = match send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if retry >= self.retries => return Err(e),
                Err(e) => e,
            };
            let delay = self.delay(retry);
            retry += 1;
            tracing::warn!(
                endpoint,
                attempt = retry,
                max_retries = self.retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "collaborator unreachable, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// [`RetryPolicy::send`] with the default schedule.
pub(crate) async fn retry_send<F, Fut>(endpoint: &str, send: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    RetryPolicy::default().send(endpoint, send).await
}
