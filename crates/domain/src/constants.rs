//! Application constants
//!
//! Store keys, alarm naming and operation labels shared by every layer.

// Persisted-state keys
pub const USER_PROFILE_KEY: &str = "user_profile";
pub const SCHEDULED_REMINDERS_KEY: &str = "scheduled_reminders";
pub const ERROR_LOGS_KEY: &str = "error_logs";
pub const FAILED_DELIVERIES_KEY: &str = "failed_deliveries";
pub const AUTH_SESSION_KEY: &str = "auth_session";

// Alarm naming: email_reminder_<epoch-ms>_<suffix>
pub const EMAIL_ALARM_PREFIX: &str = "email_reminder_";
pub const ALARM_SUFFIX_LEN: usize = 9;

// Error log operation labels
pub const OP_CREATE_CALENDAR_EVENT: &str = "createCalendarEvent";
pub const OP_SEND_GMAIL_RAW: &str = "sendGmailRaw";
pub const OP_ALARM_NO_PAYLOAD: &str = "alarm_no_payload";

// Delivery defaults
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const IMMEDIATE_DELIVERY_THRESHOLD_MS: i64 = 60_000;
pub const CALENDAR_EVENT_DURATION_MINUTES: i64 = 30;
pub const CALENDAR_REMINDER_LEAD_MINUTES: u32 = 10;
pub const DEFAULT_MAX_ERROR_LOG_ENTRIES: usize = 500;
