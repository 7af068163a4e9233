//! Retry supervisor for network-touching operations.
//!
//! Every protocol step (page fetch, identity resolution, session
//! negotiation, manifest resolution) runs under [`run`], which re-executes
//! the whole operation after a delay whenever it fails. The historical
//! policy is "retry forever every two seconds" and remains the default;
//! attempt caps and exponential backoff are opt-in.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AcfunError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. `None` retries
    /// forever, which preserves the historical recovery policy.
    pub max_attempts: Option<u32>,
    /// Delay between attempts. With backoff enabled this is the base delay.
    pub delay: Duration,
    /// When true, the delay doubles per attempt up to `max_delay`.
    pub backoff: bool,
    /// Hard cap on the computed delay when backoff is enabled.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: Duration::from_secs(2),
            backoff: false,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy with a fixed number of attempts and no backoff, mainly for
    /// callers that cannot tolerate an unbounded retry loop.
    pub fn with_max_attempts(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay,
            ..Self::default()
        }
    }

    /// Compute the delay for a given attempt number (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.backoff {
            return self.delay;
        }

        // 2^attempt with a checked shift so large attempt numbers saturate
        // instead of overflowing.
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Execute an async operation under the retry policy.
///
/// On `Err` the *entire* operation is re-run from its start after the
/// policy's delay; the loop is iterative, so sustained failure does not grow
/// the call stack. Logical unavailability is an `Ok` value and never reaches
/// the retry path. If a configured attempt cap is exhausted, the last error
/// is returned to the caller.
pub async fn run<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    operation: F,
) -> Result<T, AcfunError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AcfunError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if let Some(max) = policy.max_attempts
                    && attempt + 1 >= max
                {
                    warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up after repeated failures"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
