//! Diagnostic records: the error log and retained failed deliveries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reminder::EmailPayload;

/// Appended when an operation exhausts its retries or hits a recoverable
/// inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub time: DateTime<Utc>,
    pub operation: String,
    pub attempts: u32,
    pub error: String,
}

/// A deferred email whose delivery was exhausted. The payload stays in the
/// store under `alarm_id` until purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDelivery {
    pub alarm_id: String,
    pub subject: String,
    /// Epoch milliseconds
    pub failed_at: i64,
    pub error: String,
}

/// Failed delivery together with its retained payload, if still present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedReminder {
    #[serde(flatten)]
    pub delivery: FailedDelivery,
    pub payload: Option<EmailPayload>,
}
