//! Request and response shapes exchanged with the panel and page scripts.

use feedminder_domain::{ReminderRecord, ReminderRequest, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BackgroundRequest {
    ScheduleReminder {
        data: ReminderRequest,
    },
    SignIn,
    SignOut,
    GetUser,
    GetPendingReminders,
    CancelReminder {
        #[serde(rename = "alarmId")]
        alarm_id: String,
    },
    GetErrorLogs,
    ClearErrorLogs,
    GetFailedReminders,
    PurgeFailedReminder {
        #[serde(rename = "alarmId")]
        alarm_id: String,
    },
}

impl BackgroundRequest {
    /// Wire name of the action, used in logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::ScheduleReminder { .. } => "schedule_reminder",
            Self::SignIn => "sign_in",
            Self::SignOut => "sign_out",
            Self::GetUser => "get_user",
            Self::GetPendingReminders => "get_pending_reminders",
            Self::CancelReminder { .. } => "cancel_reminder",
            Self::GetErrorLogs => "get_error_logs",
            Self::ClearErrorLogs => "clear_error_logs",
            Self::GetFailedReminders => "get_failed_reminders",
            Self::PurgeFailedReminder { .. } => "purge_failed_reminder",
        }
    }
}

/// `{ success, data? | profile? | reminders? | error? }`
///
/// `profile` is serialized whenever it was set, so `get_user` answers with an
/// explicit `null` when nobody is signed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<ReminderRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackgroundResponse {
    /// Bare acknowledgement.
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    pub fn with_data(data: Value) -> Self {
        Self { success: true, data: Some(data), ..Self::default() }
    }

    pub fn with_profile(profile: Option<&UserProfile>) -> Self {
        let profile = profile.map_or(Value::Null, |p| serde_json::to_value(p).unwrap_or(Value::Null));
        Self { success: true, profile: Some(profile), ..Self::default() }
    }

    pub fn with_reminders(reminders: Vec<ReminderRecord>) -> Self {
        Self { success: true, reminders: Some(reminders), ..Self::default() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), ..Self::default() }
    }
}
