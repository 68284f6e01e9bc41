//! # Feedminder Domain
//!
//! Business domain types and models for Feedminder.
//!
//! This crate contains:
//! - Reminder requests, deferred-reminder records and payloads
//! - Diagnostic records (error log, failed deliveries)
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Feedminder crates
//! - Pure data structures; no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
