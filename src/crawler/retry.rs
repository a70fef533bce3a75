//! Bounded retry with exponential backoff
//!
//! The loop is generic over a single attempt so the policy can be exercised
//! without a network.

use crate::config::FetchConfig;
use crate::crawler::fetcher::FetchOutcome;
use std::future::Future;
use std::time::Duration;

/// Failure of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Malformed URL or protocol error; never retried
    Malformed(String),

    /// Text decoding error; never retried
    Encoding(String),

    /// Connection, timeout or TLS handshake failure; retried with backoff
    Retryable(String),

    /// Anything else; never retried
    Unexpected(String),
}

/// How many times, and how patiently, a retryable failure is re-attempted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt; doubles after each one
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.retries,
            Duration::from_secs_f64(config.backoff_base.max(0.0)),
        )
    }

    /// Sleep between attempt `attempt` (0-based) and the next one
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Every delay the policy can sleep, in order
    pub fn delays(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(300))
    }
}

/// Runs `attempt` until it succeeds, fails terminally or runs out of attempts
///
/// | Attempt error | Action |
/// |---------------|--------|
/// | `Malformed` | Immediate → `FetchOutcome::Malformed` |
/// | `Encoding` | Immediate → `FetchOutcome::Encoding` |
/// | `Retryable` | Sleep `backoff_base * 2^attempt`, retry; last → `FetchOutcome::Connection` |
/// | `Unexpected` | Immediate → `FetchOutcome::Malformed`, logged as error |
///
/// The closure receives the 0-based attempt number.
pub async fn run_with_retry<F, Fut>(policy: &RetryPolicy, url: &str, mut attempt: F) -> FetchOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, AttemptError>>,
{
    let attempts = policy.max_attempts.max(1);

    for n in 0..attempts {
        match attempt(n).await {
            Ok(body) => return FetchOutcome::Success(body),

            Err(AttemptError::Malformed(reason)) => {
                tracing::warn!("Error {} for {}", reason, url);
                return FetchOutcome::Malformed(reason);
            }

            Err(AttemptError::Encoding(reason)) => {
                tracing::warn!("Encoding error {} for {}", reason, url);
                return FetchOutcome::Encoding(reason);
            }

            Err(AttemptError::Retryable(reason)) => {
                tracing::warn!(
                    "Connection error or timeout on attempt {}/{} for {}: {}",
                    n + 1,
                    attempts,
                    url,
                    reason
                );
                if n + 1 < attempts {
                    tokio::time::sleep(policy.delay_for(n)).await;
                    continue;
                }
                return FetchOutcome::Connection(reason);
            }

            Err(AttemptError::Unexpected(reason)) => {
                tracing::error!("Unexpected error: {} for {}", reason, url);
                return FetchOutcome::Malformed(reason);
            }
        }
    }

    FetchOutcome::Malformed("no attempt was made".to_string())
}
