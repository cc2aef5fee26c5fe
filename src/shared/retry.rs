//! Retry with exponential backoff
//!
//! Re-issues an async call while it keeps failing with an error the caller
//! deems transient. Payment charges go through it on provider network errors.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
    /// Maximum delay between retries (cap).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryConfig {
    /// Delay to wait before `attempt` (1-based). The first attempt is immediate.
    ///
    /// `delay(n) = min(initial_delay * multiplier^(n-2), max_delay)` for `n >= 2`.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        let cap = self.max_delay.as_nanos() as f64;

        Duration::from_nanos(nanos.min(cap) as u64)
    }
}

/// Execute an async operation with exponential backoff retry.
///
/// The `should_retry` closure determines whether a given error is transient
/// (and therefore retryable) or permanent (bail immediately). When attempts
/// run out the last error is returned unchanged.
///
/// # Example
/// ```ignore
/// let charged = retry_with_backoff(
///     RetryConfig::default(),
///     || provider.charge(&invoice),
///     PaymentError::is_transient,
///     "charge_invoice",
/// ).await;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt,
                        "Call went through after retrying"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= max_attempts || !should_retry(&err) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Giving up on call"
                    );
                    return Err(err);
                }

                let delay = config.delay_before_attempt(attempt + 1);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Call failed, backing off before next attempt"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
