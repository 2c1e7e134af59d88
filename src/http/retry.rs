//! Retry policy for transient HTTP failures

use crate::http::TransportError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

/// Bounded retry with exponential backoff.
///
/// `retryable` decides which failures are worth another attempt; everything
/// else is surfaced after the first try.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub retryable: fn(&TransportError) -> bool,
}

/// The last error of a retried operation and how many attempts were made
#[derive(Debug, Error)]
#[error("{last} (after {attempts} attempt(s))")]
pub struct RetryFailure {
    pub attempts: usize,
    pub last: TransportError,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
            retryable: is_transient,
        }
    }

    /// Same attempt budget, no sleeping between attempts
    pub fn no_backoff(mut self) -> Self {
        self.base_delay = Duration::ZERO;
        self.max_delay = Duration::ZERO;
        self
    }

    pub fn with_predicate(mut self, retryable: fn(&TransportError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Delay to sleep after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryFailure>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && (self.retryable)(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label, attempt, self.max_attempts, e, delay
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!("{} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(RetryFailure {
                        attempts: attempt,
                        last: e,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Default predicate: network trouble, 429 and 5xx are transient
pub fn is_transient(err: &TransportError) -> bool {
    match err {
        TransportError::Timeout | TransportError::Connect(_) | TransportError::Body(_) => true,
        TransportError::Status(code) => *code == 429 || (500..600).contains(code),
        TransportError::Io(_) => false,
    }
}
