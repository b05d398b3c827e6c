//! Retry with exponential backoff for transient service errors
//!
//! Only errors for which [`crate::error::ProbeError::is_retryable`] holds are retried
//! (throttling, timeouts, connection failures). Everything else is
//! returned on the first attempt.

use crate::config::AwsConfig;
use crate::error::ProbeResult;
use metrics::counter;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry budget for one service call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

impl From<&AwsConfig> for RetryPolicy {
    fn from(config: &AwsConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

/// Exponential backoff with ±25% jitter, never above `max_ms`.
pub fn calculate_backoff(attempt: u32, initial_ms: u64, max_ms: u64) -> Duration {
    let exp = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let capped = initial_ms.saturating_mul(exp).min(max_ms);
    let jitter_range = capped / 4;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range * 2)
    } else {
        0
    };
    let with_jitter = capped
        .saturating_sub(jitter_range)
        .saturating_add(jitter)
        .min(max_ms);
    Duration::from_millis(with_jitter)
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. The last error is returned.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op: &str, mut call: F) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let backoff =
                    calculate_backoff(attempt, policy.initial_backoff_ms, policy.max_backoff_ms);
                warn!(op, attempt, error = %e, "Transient error, will retry");
                debug!(op, backoff_ms = backoff.as_millis() as u64, "Backing off");
                counter!("s3v.requests.retried", "op" => op.to_string()).increment(1);
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use parking_lot::Mutex;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_calculate_backoff_zero_attempt() {
        let b = calculate_backoff(0, 200, 10_000);
        assert!(b.as_millis() >= 150 && b.as_millis() <= 250);
    }

    #[test]
    fn test_calculate_backoff_capped() {
        let b = calculate_backoff(20, 200, 10_000);
        assert!(b.as_millis() <= 10_000);
        let b = calculate_backoff(u32::MAX, 200, 10_000);
        assert!(b.as_millis() <= 10_000);
    }

    #[test]
    fn test_calculate_backoff_grows() {
        let b0 = calculate_backoff(0, 200, 100_000);
        let b2 = calculate_backoff(2, 200, 100_000);
        assert!(b2 > b0);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = Mutex::new(0u32);
        let result = with_retry(&fast(), "QueryVectors", || {
            let n = {
                let mut calls = calls.lock();
                *calls += 1;
                *calls
            };
            async move {
                if n < 3 {
                    Err(ProbeError::RateLimited("slow down".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(*calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = Mutex::new(0u32);
        let result: ProbeResult<()> = with_retry(&fast(), "PutVectors", || {
            *calls.lock() += 1;
            async { Err(ProbeError::Validation("bad dimension".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProbeError::Validation(_))));
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_budget_exhausted_returns_last_error() {
        let calls = Mutex::new(0u32);
        let result: ProbeResult<()> = with_retry(&fast(), "DeleteVectors", || {
            *calls.lock() += 1;
            async { Err(ProbeError::Connection("reset".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProbeError::Connection(_))));
        assert_eq!(*calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let calls = Mutex::new(0u32);
        let _ = with_retry::<(), _, _>(&RetryPolicy::none(), "GetIndex", || {
            *calls.lock() += 1;
            async { Err(ProbeError::Timeout("slow".into())) }
        })
        .await;
        assert_eq!(*calls.lock(), 1);
    }
}
