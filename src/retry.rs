//! Bounded retry with a caller-supplied delay schedule.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::Result;

/// Maximum number of attempts for fetches and summarizations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry policy: how many attempts, and how long to wait before each retry.
///
/// Attempt indices are 0-based. Nothing is awaited before attempt 0; before
/// attempt `i > 0` the helper sleeps `delay(i)`.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: fn(u32) -> Duration,
}

fn fetch_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt) * 2)
}

fn summarize_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt))
}

impl RetryPolicy {
    /// Feed fetch schedule: 3 attempts, 2s then 4s between them.
    pub const FETCH: RetryPolicy = RetryPolicy::new(DEFAULT_MAX_ATTEMPTS, fetch_delay);

    /// Summarization schedule: 3 attempts, 1s then 2s between them.
    pub const SUMMARIZE: RetryPolicy = RetryPolicy::new(DEFAULT_MAX_ATTEMPTS, summarize_delay);

    /// Create a policy. A `max_attempts` of zero is treated as one.
    pub const fn new(max_attempts: u32, delay: fn(u32) -> Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Total number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the attempt with the given index.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            (self.delay)(attempt)
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the 0-based attempt index. Returns the first success
/// or the error of the last attempt. No sleep follows the final failure.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    clock: &dyn Clock,
    what: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("attempt {} to {} failed: {}", attempt + 1, what, e);
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                info!("retry {} {}", attempt, what);
                clock.sleep(policy.delay_before(attempt)).await;
            }
        }
    }
}
