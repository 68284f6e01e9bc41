//! Reminder requests, deferred-reminder records and scheduling outcomes

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::EMAIL_ALARM_PREFIX;
use crate::errors::{FeedminderError, Result};
use crate::impl_wire_name_conversions;

/// Delivery channel requested for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    Calendar,
    Email,
}

impl_wire_name_conversions!(ReminderType {
    Calendar => "calendar",
    Email => "email",
});

/// Input to scheduling. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub types: BTreeSet<ReminderType>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 timestamp, e.g. `2024-05-01T09:30:00.000Z`
    pub start_time: DateTime<Utc>,
}

impl ReminderRequest {
    pub fn validate(&self) -> Result<()> {
        if self.types.is_empty() {
            return Err(FeedminderError::InvalidInput(
                "at least one reminder type is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wants(&self, kind: ReminderType) -> bool {
        self.types.contains(&kind)
    }

    /// Subject and body delivered by the mail client.
    pub fn email_payload(&self) -> EmailPayload {
        EmailPayload { subject: self.title.clone(), body: self.description.clone() }
    }
}

/// Persisted representation of a deferred email reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    pub alarm_id: String,
    pub types: BTreeSet<ReminderType>,
    pub title: String,
    pub description: String,
    /// Epoch milliseconds
    pub scheduled_time: i64,
    /// Epoch milliseconds
    pub created_at: i64,
}

/// Message content stored under the alarm id until the alarm fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub subject: String,
    pub body: String,
}

/// Build an alarm id from the creation time and a random suffix.
pub fn email_alarm_id(created_at_ms: i64, suffix: &str) -> String {
    format!("{EMAIL_ALARM_PREFIX}{created_at_ms}_{suffix}")
}

pub fn is_email_alarm(name: &str) -> bool {
    name.starts_with(EMAIL_ALARM_PREFIX)
}

/// Result of the calendar branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarOutcome {
    Created,
}

/// Result of the email branch: `"sent_immediate"` or
/// `{"scheduled": true, "alarmId": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmailOutcome {
    Immediate(ImmediateDelivery),
    Scheduled(ScheduledEmail),
}

impl EmailOutcome {
    pub fn sent_immediate() -> Self {
        Self::Immediate(ImmediateDelivery::SentImmediate)
    }

    pub fn scheduled(alarm_id: String) -> Self {
        Self::Scheduled(ScheduledEmail { scheduled: true, alarm_id })
    }

    pub fn alarm_id(&self) -> Option<&str> {
        match self {
            Self::Scheduled(s) => Some(&s.alarm_id),
            Self::Immediate(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmediateDelivery {
    SentImmediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEmail {
    pub scheduled: bool,
    pub alarm_id: String,
}

/// Combined result of `schedule_reminder`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailOutcome>,
}
