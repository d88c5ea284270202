//! Exponential backoff for rate-limited requests
//!
//! Only HTTP 429 responses are retried. Every other failure, and the last 429
//! once the retry budget is spent, is handed back to the caller unchanged.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::ApiError;

/// How many times, and how patiently, a rate-limited request is re-sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    /// Unit of the exponential delay: retry `n` waits `2^n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that surfaces the first 429 without retrying
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Position of one logical request within its retry chain
///
/// Contexts are immutable; [`RetryContext::next`] returns the context for the
/// following attempt instead of bumping a counter in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    attempt: u32,
    policy: RetryPolicy,
}

impl RetryContext {
    /// Context for the first, non-retry dispatch
    pub fn initial(policy: RetryPolicy) -> Self {
        Self { attempt: 0, policy }
    }

    /// Number of retries already performed (0 on the first dispatch)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Context for the next retry, or `None` once the budget is exhausted
    pub fn next(&self) -> Option<Self> {
        (self.attempt < self.policy.max_retries).then(|| Self {
            attempt: self.attempt + 1,
            policy: self.policy,
        })
    }

    /// Delay to wait before dispatching this attempt
    pub fn delay(&self) -> Duration {
        if self.attempt == 0 {
            return Duration::ZERO;
        }
        self.policy
            .base_delay
            .saturating_mul(2u32.saturating_pow(self.attempt))
    }
}

/// Runs `op` until it succeeds, fails with something other than a 429, or
/// the policy runs out of retries.
///
/// `op` receives the context of the attempt it is performing so callers can
/// log or tag the dispatch.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut(RetryContext) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut ctx = RetryContext::initial(policy);

    loop {
        match op(ctx).await {
            Err(err) if err.is_rate_limited() => {
                let Some(next) = ctx.next() else {
                    warn!(
                        attempts = ctx.attempt() + 1,
                        "rate limited, retries exhausted"
                    );
                    return Err(err);
                };
                let delay = next.delay();
                warn!(
                    retry = next.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                ctx = next;
            }
            result => return result,
        }
    }
}
