//! Bounded retry for single remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::config::DiscoveryConfig;
use crate::remote::RemoteError;

/// How often and how patiently a single call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    /// Delay between attempts. Doubled after a timeout.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.retries_per_page, config.retry_delay())
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Delay to wait after `err` before the next attempt.
    pub fn delay_after(&self, err: &RemoteError) -> Duration {
        if err.is_timeout() {
            self.delay * 2
        } else {
            self.delay
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned on give-up.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let attempts = self.attempts();
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.delay_after(&e);
                    warn!(
                        call = label,
                        attempt,
                        attempts,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        call = label,
                        attempt,
                        attempts,
                        error = %e,
                        "Giving up on request"
                    );
                    return Err(e);
                }
            }
        }
    }
}
