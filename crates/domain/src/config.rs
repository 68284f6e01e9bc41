//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    CALENDAR_EVENT_DURATION_MINUTES, CALENDAR_REMINDER_LEAD_MINUTES, DEFAULT_INITIAL_RETRY_DELAY_MS,
    DEFAULT_MAX_ERROR_LOG_ENTRIES, DEFAULT_RETRY_ATTEMPTS, IMMEDIATE_DELIVERY_THRESHOLD_MS,
};
use crate::errors::{FeedminderError, Result};

/// Application configuration
///
/// Every section has defaults, so a config file only needs the values it
/// changes (typically `google.client_id`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub delivery: DeliveryConfig,
    pub alarms: AlarmConfig,
    pub auth: AuthConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(FeedminderError::Config("database.pool_size must be positive".into()));
        }
        if self.google.client_id.trim().is_empty() {
            return Err(FeedminderError::Config("google.client_id must not be empty".into()));
        }
        if self.delivery.retry_attempts == 0 {
            return Err(FeedminderError::Config("delivery.retry_attempts must be at least 1".into()));
        }
        // A sweep may wait on an interactive sign-in while sending mail.
        if self.alarms.job_timeout_secs <= self.auth.interactive_timeout_secs {
            return Err(FeedminderError::Config(
                "alarms.job_timeout_secs must exceed auth.interactive_timeout_secs".into(),
            ));
        }
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "feedminder.db".to_string(), pool_size: 4 }
    }
}

/// Google OAuth client and API endpoints
///
/// Endpoints are configurable so tests can point the adapters at a local mock
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revoke_endpoint: String,
    pub userinfo_endpoint: String,
    pub calendar_api_base: String,
    pub gmail_api_base: String,
    pub scopes: Vec<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            revoke_endpoint: "https://accounts.google.com/o/oauth2/revoke".to_string(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            calendar_api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            gmail_api_base: "https://gmail.googleapis.com/gmail/v1".to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
                "https://www.googleapis.com/auth/calendar.events".to_string(),
                "https://www.googleapis.com/auth/gmail.send".to_string(),
            ],
        }
    }
}

/// Delivery timing and retry behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Total attempts per delivery, initial try included
    pub retry_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub initial_retry_delay_ms: u64,
    /// Emails due sooner than this are sent inline instead of scheduled
    pub immediate_threshold_ms: i64,
    pub event_duration_minutes: i64,
    pub reminder_lead_minutes: u32,
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            initial_retry_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            immediate_threshold_ms: IMMEDIATE_DELIVERY_THRESHOLD_MS,
            event_duration_minutes: CALENDAR_EVENT_DURATION_MINUTES,
            reminder_lead_minutes: CALENDAR_REMINDER_LEAD_MINUTES,
            request_timeout_secs: 30,
        }
    }
}

/// Alarm sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Six-field cron expression (seconds first)
    pub sweep_cron: String,
    pub job_timeout_secs: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self { sweep_cron: "*/15 * * * * *".to_string(), job_timeout_secs: 300 }
    }
}

/// Identity provider behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long an interactive sign-in waits for the browser redirect
    pub interactive_timeout_secs: u64,
    /// Refresh cached access tokens this many seconds before expiry
    pub refresh_threshold_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { interactive_timeout_secs: 180, refresh_threshold_seconds: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Newest error log entries kept; `None` keeps everything
    pub max_error_log_entries: Option<usize>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { max_error_log_entries: Some(DEFAULT_MAX_ERROR_LOG_ENTRIES) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.google.client_id = "client.apps.googleusercontent.com".into();
        config
    }

    #[test]
    fn defaults_match_delivery_contract() {
        let config = Config::default();
        assert_eq!(config.delivery.retry_attempts, 3);
        assert_eq!(config.delivery.initial_retry_delay_ms, 1_000);
        assert_eq!(config.delivery.immediate_threshold_ms, 60_000);
        assert_eq!(config.delivery.event_duration_minutes, 30);
        assert_eq!(config.diagnostics.max_error_log_entries, Some(500));
    }

    #[test]
    fn validate_rejects_missing_client_id() {
        assert!(matches!(Config::default().validate(), Err(FeedminderError::Config(_))));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_attempts_and_pool() {
        let mut config = valid();
        config.delivery.retry_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.database.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_sweep_timeout_above_interactive_timeout() {
        assert!(valid().alarms.job_timeout_secs > valid().auth.interactive_timeout_secs);

        let mut config = valid();
        config.alarms.job_timeout_secs = config.auth.interactive_timeout_secs;
        assert!(matches!(config.validate(), Err(FeedminderError::Config(msg)) if msg.contains("job_timeout_secs")));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "google": { "client_id": "abc" }, "delivery": { "retry_attempts": 5 } }"#)
                .unwrap();
        assert_eq!(config.google.client_id, "abc");
        assert_eq!(config.google.token_endpoint, "https://oauth2.googleapis.com/token");
        assert_eq!(config.delivery.retry_attempts, 5);
        assert_eq!(config.delivery.initial_retry_delay_ms, 1_000);
    }
}
