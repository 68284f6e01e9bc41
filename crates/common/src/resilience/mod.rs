//! Resilience patterns for transient failures
//!
//! Generic over the operation's error type. Domain code decides what to do
//! with the terminal error (the delivery services record it in the error log
//! before surfacing it).

pub mod retry;

pub use retry::{
    policies, retry_with_policy, BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryDecision,
    RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
