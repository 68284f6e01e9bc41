//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Feedminder
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FeedminderError {
    /// Silent token acquisition found no cached or refreshable session
    #[error("No cached authorization is available")]
    AuthUnavailable,

    /// Interactive authorization was declined, timed out or rejected
    #[error("Authorization denied: {0}")]
    AuthDenied(String),

    #[error("Failed to fetch user profile: {0}")]
    ProfileFetchFailed(String),

    #[error("Calendar API failed after {attempts} attempts: {message}")]
    CalendarDeliveryFailed { attempts: u32, message: String },

    #[error("Gmail API failed after {attempts} attempts: {message}")]
    MailDeliveryFailed { attempts: u32, message: String },

    /// No token could be obtained at all; never retried
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeedminderError {
    /// Failures that may succeed if the same call is repeated.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Database(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for Feedminder operations
pub type Result<T> = std::result::Result<T, FeedminderError>;
