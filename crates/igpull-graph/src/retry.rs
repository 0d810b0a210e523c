//! Bounded retry with exponential back-off for graph API calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx, 429). Everything else is
//! returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use igpull_core::RetrySettings;

use crate::error::GraphError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused/reset, request errors.
/// - Upstream 5xx and 429 responses.
///
/// **Not retriable:** every other upstream status, local validation and
/// credential errors, malformed bodies, not-found lookups.
pub(crate) fn is_retriable(err: &GraphError) -> bool {
    match err {
        GraphError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        GraphError::Upstream { status, .. } => *status >= 500 || *status == 429,
        GraphError::NotFound(_)
        | GraphError::Validation(_)
        | GraphError::MissingCredentials
        | GraphError::InvalidUrl { .. }
        | GraphError::Deserialize { .. }
        | GraphError::PaginationLimit { .. } => false,
    }
}

/// Attempt budget and delay schedule for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            multiplier: settings.multiplier,
            min_delay: settings.min_delay,
            max_delay: settings.max_delay,
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt budget and no sleeping between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based).
    ///
    /// `multiplier * 2^(attempt - 1)`, raised to `min_delay` and capped at
    /// `max_delay`. With the defaults (1 s, 2 s, 10 s): 2 s, 2 s, 4 s, 8 s, 10 s.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.multiplier
            .saturating_mul(1u32 << exponent)
            .max(self.min_delay)
            .min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// the policy's attempt budget is spent. The last error is returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    context: &str,
    mut operation: F,
) -> Result<T, GraphError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GraphError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    context,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient graph API error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
