//! Retry policy with bounded exponential backoff for provider calls.

use crate::error::PipelineResult;
use crate::generation::GenerationError;
use cf_protocol::RetrySettings;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often and how patiently a provider call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each following retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(RetrySettings::default())
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the `retry`-th retry (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// How a retried provider call ended.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success(T),
    /// A non-transient error, or the last transient one.
    Failed {
        error: GenerationError,
        attempts: u32,
    },
    /// Cancelled while waiting to retry.
    Cancelled,
}

/// Run `operation` under `policy`.
///
/// Transient errors are retried. `on_retry` runs once the backoff has
/// elapsed and right before the retried call, with the retry number and
/// the previous error message. Non-transient errors end the loop
/// immediately. A cancelled `cancel` token interrupts the backoff sleep,
/// never the call in flight, and a retry cut short that way is not
/// reported to `on_retry`.
///
/// # Errors
///
/// Only errors returned by `on_retry` are propagated; provider errors are
/// reported through [`RetryOutcome::Failed`].
pub async fn retry_with_backoff<T, Op, Fut, OnRetry, RetryFut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: Op,
    mut on_retry: OnRetry,
) -> PipelineResult<RetryOutcome<T>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
    OnRetry: FnMut(u32, String) -> RetryFut,
    RetryFut: Future<Output = PipelineResult<()>>,
{
    let mut attempt = 1u32;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(RetryOutcome::Success(value)),
            Err(error) => error,
        };

        if !error.is_transient() || attempt >= policy.max_attempts {
            return Ok(RetryOutcome::Failed {
                error,
                attempts: attempt,
            });
        }

        let delay = policy.delay_for_retry(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Retrying provider call");

        tokio::select! {
            _ = cancel.cancelled() => return Ok(RetryOutcome::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        if cancel.is_cancelled() {
            return Ok(RetryOutcome::Cancelled);
        }

        on_retry(attempt, error.to_string()).await?;
        attempt += 1;
    }
}
