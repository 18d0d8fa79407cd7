// crates/drape-mask/src/retry.rs
//
// Per-call timeout and exponential-backoff retry for hosted-model calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use drape_core::DrapeError;

/// Retry behaviour for one external call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles (by `backoff_multiplier`) after.
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Spread each delay by up to +/-25%.
    pub jitter: bool,
    /// Budget for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: true,
            timeout: Duration::from_secs(180),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the given timeout.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            max_retries: 0,
            timeout,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (1-based). Attempt 0 is immediate.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponential = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64).max(0.0) as u64;

        if self.jitter {
            let spread = delay_ms / 4;
            if spread > 0 {
                let offset = rand::thread_rng().gen_range(0..=spread * 2);
                return Duration::from_millis(delay_ms - spread + offset);
            }
        }

        Duration::from_millis(delay_ms)
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run
    /// out. Only external failures and timeouts are retried.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, DrapeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DrapeError>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(DrapeError::Timeout(format!(
                    "{} exceeded {:?}",
                    label, self.timeout
                ))),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        call = label,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying hosted-model call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_transient(error: &DrapeError) -> bool {
    matches!(error, DrapeError::External(_) | DrapeError::Timeout(_))
}
