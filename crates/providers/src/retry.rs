//! Exponential backoff for transient vendor errors.
//!
//! Only errors for which [`Error::is_transient`] holds are retried. Any
//! other error is returned untouched on the first occurrence. When the
//! attempt budget runs out the last transient error is wrapped into
//! [`Error::Provider`].

use lm_domain::config::RetryConfig;
use lm_domain::error::{Error, Result};
use lm_domain::trace::TraceEvent;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (0-based): the initial delay,
    /// doubled per retry, capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` under this policy, sleeping on the tokio timer.
    pub async fn execute<F, Fut, T>(&self, provider: &str, operation: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_sleep(provider, operation, op, tokio::time::sleep)
            .await
    }

    /// Like [`execute`](Self::execute) with a caller-supplied sleep.
    pub async fn execute_with_sleep<F, Fut, T, S, SFut>(
        &self,
        provider: &str,
        operation: &str,
        mut op: F,
        sleep: S,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let budget = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if attempt >= budget {
                tracing::error!(
                    provider = %provider,
                    operation = %operation,
                    attempts = budget,
                    error = %err,
                    "retry budget exhausted"
                );
                return Err(Error::Provider {
                    provider: provider.to_string(),
                    message: format!("{operation} failed after {budget} attempts: {err}"),
                });
            }

            let delay = self.delay_for(attempt - 1);
            tracing::warn!(
                provider = %provider,
                operation = %operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient provider error, retrying"
            );
            TraceEvent::LlmRetry {
                provider: provider.to_string(),
                operation: operation.to_string(),
                attempt,
                delay_ms: delay.as_millis() as u64,
                error: err.to_string(),
            }
            .emit();

            sleep(delay).await;
            attempt += 1;
        }
    }
}
