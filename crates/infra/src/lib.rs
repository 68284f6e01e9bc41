//! # Feedminder Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence (durable key-value store, alarm table)
//! - HTTP client plumbing
//! - Google integrations (OAuth identity, userinfo, Calendar, Gmail)
//! - The cron-driven alarm sweep
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `feedminder-core`
//! - Depends on `feedminder-common`, `feedminder-domain` and `feedminder-core`
//! - Contains all "impure" code (I/O, sockets, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::{DbManager, SqliteAlarmClock, SqliteKeyValueStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::google::{
    AuthorizationPrompt, GmailClient, GoogleCalendarClient, GoogleIdentityProvider,
    GoogleUserInfoClient, LoggingPrompt,
};
pub use scheduling::{AlarmSweepConfig, AlarmSweepScheduler, SweepError};
