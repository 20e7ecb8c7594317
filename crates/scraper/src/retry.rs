//! Bounded retry with exponential backoff
//!
//! One combinator covers every retried automation step: the four form
//! sub-steps, per-market selection and anything else that can hit a
//! transient fault. Retries are sequential, never parallel, to avoid
//! amplifying load against the fragile external source.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// First retry delay; doubles per subsequent attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Base-2 exponential delay before retrying after `attempt` (0-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `action` until it succeeds, the fault classifier reports a terminal
/// fault, or attempts are exhausted. The final fault is returned to the
/// caller, which decides whether it is fatal.
pub async fn with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut action: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_fault = None;

    for attempt in 0..attempts {
        match action().await {
            Ok(value) => return Ok(value),
            Err(fault) if !fault.is_retryable() => return Err(fault),
            Err(fault) => {
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    attempts,
                    fault = %fault,
                    "Automation step faulted"
                );
                last_fault = Some(fault);
                if attempt + 1 < attempts {
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    Err(last_fault.unwrap_or_else(|| ScrapeError::Session(format!("{operation} never ran"))))
}
