//! Retry with error logging
//!
//! Wraps the generic [`RetryExecutor`] with the delivery policy: every failure
//! is retried, the delay doubles after each failure, and exhaustion appends an
//! [`ErrorLogEntry`] before the final error is handed back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use feedminder_common::resilience::policies::AlwaysRetry;
use feedminder_common::resilience::{BackoffStrategy, RetryConfig, RetryExecutor};
use feedminder_domain::constants::RETRY_BACKOFF_MULTIPLIER;
use feedminder_domain::{DeliveryConfig, ErrorLogEntry, FeedminderError, Result};
use tracing::{debug, warn};

use crate::clock_ports::Clock;
use crate::storage::ReminderStore;

const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Terminal failure of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    /// Attempts made before giving up
    pub attempts: u32,
    /// Error from the final attempt
    pub error: FeedminderError,
}

/// Bounded exponential-backoff retries that log exhaustion to the store.
#[derive(Clone)]
pub struct RetryingExecutor {
    executor: RetryExecutor<AlwaysRetry>,
    store: ReminderStore,
    clock: Arc<dyn Clock>,
}

impl RetryingExecutor {
    /// `retries` is the total number of attempts; values below 1 are treated
    /// as 1.
    pub fn new(
        store: ReminderStore,
        clock: Arc<dyn Clock>,
        retries: u32,
        initial_delay: Duration,
    ) -> Self {
        let config = RetryConfig {
            max_attempts: retries.max(1),
            backoff: BackoffStrategy::Exponential {
                initial_delay,
                base: RETRY_BACKOFF_MULTIPLIER,
                max_delay: MAX_BACKOFF.max(initial_delay),
            },
            max_total_time: None,
        };
        Self { executor: RetryExecutor::new(config, AlwaysRetry), store, clock }
    }

    pub fn from_config(store: ReminderStore, clock: Arc<dyn Clock>, config: &DeliveryConfig) -> Self {
        Self::new(
            store,
            clock,
            config.retry_attempts,
            Duration::from_millis(config.initial_retry_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.executor.config().max_attempts
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// On exhaustion one error log entry labelled `label` is written, then the
    /// last error is returned with the number of attempts made.
    pub async fn with_retry<T, F, Fut>(
        &self,
        label: &str,
        operation: F,
    ) -> std::result::Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let outcome = self.executor.execute_with_outcome(operation).await;
        let attempts = outcome.attempts;

        match outcome.result {
            Ok(value) => {
                if attempts > 1 {
                    debug!(operation = label, attempts, "succeeded after retry");
                }
                Ok(value)
            }
            Err(err) => {
                let attempts = err.attempts().unwrap_or(attempts);
                let description = err.to_string();
                let error = err
                    .into_source()
                    .unwrap_or_else(|| FeedminderError::Internal(description));

                self.log_exhaustion(label, attempts, &error).await;
                Err(RetryFailure { attempts, error })
            }
        }
    }

    async fn log_exhaustion(&self, label: &str, attempts: u32, error: &FeedminderError) {
        warn!(operation = label, attempts, error = %error, "retries exhausted");
        let entry = ErrorLogEntry {
            time: self.clock.now(),
            operation: label.to_string(),
            attempts,
            error: error.to_string(),
        };
        if let Err(e) = self.store.append_error_log(entry).await {
            warn!(operation = label, error = %e, "failed to record error log entry");
        }
    }
}
