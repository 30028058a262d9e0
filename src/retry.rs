#![cfg(feature = "std")]

//! Bounded retry with linear backoff for state-mutating ledger calls.

use std::fmt;
use std::future::Future;

use tokio::time::{sleep, Duration};

use crate::config::AgentConfig;
use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// What happened across all attempts of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub operation: &'static str,
    pub value: Option<T>,
    pub attempts: u32,
    /// Backoff slept before each retry, in order.
    pub delays: Vec<Duration>,
    pub last_error: Option<String>,
}

impl<T> RetryOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.value.is_some()
    }

    pub fn into_result(self) -> Result<T, AgentError> {
        match self.value {
            Some(v) => Ok(v),
            None => Err(AgentError::TransientSubmissionFailure {
                operation: self.operation,
                attempts: self.attempts,
                last_error: self.last_error.unwrap_or_default(),
            }),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay())
    }

    /// Backoff after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `op` until it succeeds or the attempt budget is spent. `op`
    /// receives the 1-based attempt number. Never returns an error; the
    /// outcome says whether it worked.
    pub async fn submit<T, E, F, Fut>(&self, operation: &'static str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut delays = Vec::new();
        let mut last_error = None;
        for attempt in 1..=max_attempts {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        operation,
                        value: Some(value),
                        attempts: attempt,
                        delays,
                        last_error,
                    };
                }
                Err(e) => {
                    log::warn!("Error in {} (attempt {}): {:#}", operation, attempt, e);
                    last_error = Some(format!("{:#}", e));
                    if attempt < max_attempts {
                        let delay = self.delay_after(attempt);
                        delays.push(delay);
                        sleep(delay).await;
                    }
                }
            }
        }
        RetryOutcome {
            operation,
            value: None,
            attempts: max_attempts,
            delays,
            last_error,
        }
    }
}
