//! Bounded exponential-backoff retry for transient network failures

use std::future::Future;
use std::time::Duration;

/// Retry policy with doubling delay capped at `max_delay`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Run `operation` until it succeeds or attempts are exhausted
///
/// Delays double between attempts up to the cap. The final error is
/// returned to the caller, which degrades to stale data rather than
/// aborting the cycle.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_attempts => {
                tracing::warn!(what, attempt, error = %e, "giving up after retries");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(what, attempt, error = %e, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
        }
    }
}
