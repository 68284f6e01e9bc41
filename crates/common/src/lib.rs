//! Shared utilities for Feedminder crates.
//!
//! # Feature Tiers
//!
//! - `foundation`: serde/chrono/thiserror re-use only
//! - `runtime`: async building blocks (retry executor, OAuth + PKCE client)
//! - `observability`: tracing instrumentation

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

#[cfg(feature = "runtime")]
pub mod auth;
#[cfg(feature = "runtime")]
pub mod resilience;

#[cfg(feature = "runtime")]
pub use resilience::{BackoffStrategy, RetryConfig, RetryError, RetryExecutor};
