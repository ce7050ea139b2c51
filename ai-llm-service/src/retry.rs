//! Retry with exponential backoff and a per-attempt timeout.
//!
//! Every provider call goes through [`RetryPolicy::run`]. An attempt that exceeds
//! `call_timeout` becomes [`AiLlmError::Timeout`]; transient failures are retried
//! until `max_attempts` is reached, then surfaced as
//! [`AiLlmError::RetriesExhausted`]. Non-retryable errors return immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error_handler::{AiLlmError, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (values below 1 act as 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per additional attempt.
    pub backoff_multiplier: f64,
    /// Budget for a single attempt.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// `base_delay * multiplier^(attempt-1)`, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let ms = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exp);
        let capped = ms.min(self.max_delay.as_millis() as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Runs `f` under this policy.
    ///
    /// # Errors
    /// - the first non-retryable error as is
    /// - [`AiLlmError::RetriesExhausted`] wrapping the last transient error
    pub async fn run<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            let outcome = match tokio::time::timeout(self.call_timeout, f()).await {
                Ok(r) => r,
                Err(_) => Err(AiLlmError::Timeout(self.call_timeout)),
            };

            match outcome {
                Ok(v) => {
                    if attempt > 1 {
                        debug!(op, attempt, "provider call recovered after retry");
                    }
                    return Ok(v);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= attempts => {
                    warn!(op, attempts, error = %e, "retry budget exhausted");
                    return Err(AiLlmError::RetriesExhausted {
                        op,
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(op, attempt, ?delay, error = %e, "provider call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
