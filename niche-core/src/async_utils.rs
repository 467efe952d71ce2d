//! Async utilities: retry policy and timeouts
//!
//! External calls are issued one at a time; the only orchestration concern
//! handled here is how often and how long to wait before trying again.

use crate::error::{ErrorContext, NicheError, NicheResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, warn};

/// Retry policy applied at the orchestration boundary
///
/// The wait before attempt `n + 1` is
/// `clamp(multiplier_ms * backoff_base^(n - 1), min_delay_ms, max_delay_ms)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: usize,
    /// Scale factor of the exponential schedule in milliseconds
    pub multiplier_ms: u64,
    /// Exponential base
    pub backoff_base: f64,
    /// Lower bound of any single wait in milliseconds
    pub min_delay_ms: u64,
    /// Upper bound of any single wait in milliseconds
    pub max_delay_ms: u64,
    /// Whether to add +/-10% jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier_ms: 1000,
            backoff_base: 2.0,
            min_delay_ms: 4000,
            max_delay_ms: 10000,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Policy that never waits, useful for tests and dry runs
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            multiplier_ms: 0,
            backoff_base: 2.0,
            min_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Wait after the given failed attempt (1-based), before jitter
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let raw = self.multiplier_ms as f64 * self.backoff_base.powi(exponent);
        let capped = raw.max(self.min_delay_ms as f64).min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Whole wait schedule between attempts
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let jitter_factor = 0.1;
        let jitter = (fastrand::f64() - 0.5) * 2.0 * jitter_factor;
        Duration::from_millis(((delay.as_millis() as f64) * (1.0 + jitter)) as u64)
    }
}

/// Retry an async operation with exponential backoff
pub async fn retry_async<F, Fut, T, E>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_async_if(operation, |_| true, config, operation_name).await
}

/// Retry an async operation, giving up early on errors the predicate rejects
pub async fn retry_async_if<F, Fut, T, E, P>(
    mut operation: F,
    should_retry: P,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = max_attempts,
            "Attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= max_attempts || !should_retry(&error) {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %error,
                        "Operation failed, giving up"
                    );
                    return Err(error);
                }

                let delay = config.jittered(config.delay_for_attempt(attempt));
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                sleep(delay).await;
            }
        }
    }
}

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> NicheResult<T>
where
    F: Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(NicheError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &timeout_ms.to_string())
                .with_suggestion("Increase timeout duration")
                .with_suggestion("Check network connectivity"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_clamped() {
        let config = RetryConfig::default();
        assert_eq!(
            config.schedule(),
            vec![Duration::from_secs(4), Duration::from_secs(4)]
        );
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(8));
        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(40), Duration::from_secs(10));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let config = RetryConfig::immediate(4);
        assert!(config.schedule().iter().all(|d| d.is_zero()));
        assert_eq!(config.schedule().len(), 3);
    }
}
