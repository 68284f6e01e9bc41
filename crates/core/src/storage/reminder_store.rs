//! Typed access to the persisted-state keys
//!
//! Lists (`scheduled_reminders`, `error_logs`, `failed_deliveries`) are stored
//! as JSON arrays and updated read-modify-write. A missing or malformed list
//! reads as empty so one corrupt value cannot wedge the scheduler.

use std::sync::Arc;

use feedminder_common::auth::TokenSet;
use feedminder_domain::constants::{
    AUTH_SESSION_KEY, ERROR_LOGS_KEY, FAILED_DELIVERIES_KEY, SCHEDULED_REMINDERS_KEY,
    USER_PROFILE_KEY,
};
use feedminder_domain::{
    EmailPayload, ErrorLogEntry, FailedDelivery, FeedminderError, ReminderRecord, Result,
    UserProfile,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ports::KeyValueStore;

/// Typed wrapper over a [`KeyValueStore`].
///
/// Clones share the same backing store and list lock.
#[derive(Clone)]
pub struct ReminderStore {
    kv: Arc<dyn KeyValueStore>,
    max_error_log_entries: Option<usize>,
    // Serialises read-modify-write of list keys within this process.
    list_lock: Arc<Mutex<()>>,
}

impl ReminderStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv, max_error_log_entries: None, list_lock: Arc::new(Mutex::new(())) }
    }

    /// Keep only the newest `max` error log entries (`None` keeps all).
    #[must_use]
    pub fn with_error_log_limit(mut self, max: Option<usize>) -> Self {
        self.max_error_log_entries = max;
        self
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    // ------------------------------------------------------------------
    // User profile
    // ------------------------------------------------------------------

    pub async fn user_profile(&self) -> Result<Option<UserProfile>> {
        self.read_value(USER_PROFILE_KEY).await
    }

    pub async fn save_user_profile(&self, profile: &UserProfile) -> Result<()> {
        self.write_value(USER_PROFILE_KEY, profile).await
    }

    pub async fn clear_user_profile(&self) -> Result<()> {
        self.kv.remove(USER_PROFILE_KEY).await
    }

    // ------------------------------------------------------------------
    // Pending reminders
    // ------------------------------------------------------------------

    pub async fn reminders(&self) -> Result<Vec<ReminderRecord>> {
        self.read_list(SCHEDULED_REMINDERS_KEY).await
    }

    /// Append a record, replacing any record with the same alarm id.
    pub async fn append_reminder(&self, record: ReminderRecord) -> Result<()> {
        let _guard = self.list_lock.lock().await;
        let mut records: Vec<ReminderRecord> = self.read_list(SCHEDULED_REMINDERS_KEY).await?;
        records.retain(|r| r.alarm_id != record.alarm_id);
        records.push(record);
        self.write_value(SCHEDULED_REMINDERS_KEY, &records).await
    }

    /// Remove the record for `alarm_id`. Returns whether one existed.
    pub async fn remove_reminder(&self, alarm_id: &str) -> Result<bool> {
        let _guard = self.list_lock.lock().await;
        let mut records: Vec<ReminderRecord> = self.read_list(SCHEDULED_REMINDERS_KEY).await?;
        let before = records.len();
        records.retain(|r| r.alarm_id != alarm_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_value(SCHEDULED_REMINDERS_KEY, &records).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Email payloads (one key per alarm id)
    // ------------------------------------------------------------------

    pub async fn email_payload(&self, alarm_id: &str) -> Result<Option<EmailPayload>> {
        self.read_value(alarm_id).await
    }

    pub async fn save_email_payload(&self, alarm_id: &str, payload: &EmailPayload) -> Result<()> {
        self.write_value(alarm_id, payload).await
    }

    pub async fn remove_email_payload(&self, alarm_id: &str) -> Result<()> {
        self.kv.remove(alarm_id).await
    }

    // ------------------------------------------------------------------
    // Error log
    // ------------------------------------------------------------------

    pub async fn error_logs(&self) -> Result<Vec<ErrorLogEntry>> {
        self.read_list(ERROR_LOGS_KEY).await
    }

    /// Append an entry, dropping the oldest entries beyond the configured
    /// limit.
    pub async fn append_error_log(&self, entry: ErrorLogEntry) -> Result<()> {
        let _guard = self.list_lock.lock().await;
        let mut entries: Vec<ErrorLogEntry> = self.read_list(ERROR_LOGS_KEY).await?;
        entries.push(entry);
        if let Some(max) = self.max_error_log_entries {
            if entries.len() > max {
                let overflow = entries.len() - max;
                entries.drain(..overflow);
                debug!(dropped = overflow, "error log truncated");
            }
        }
        self.write_value(ERROR_LOGS_KEY, &entries).await
    }

    pub async fn clear_error_logs(&self) -> Result<()> {
        let _guard = self.list_lock.lock().await;
        self.kv.remove(ERROR_LOGS_KEY).await
    }

    // ------------------------------------------------------------------
    // Failed deliveries
    // ------------------------------------------------------------------

    pub async fn failed_deliveries(&self) -> Result<Vec<FailedDelivery>> {
        self.read_list(FAILED_DELIVERIES_KEY).await
    }

    pub async fn append_failed_delivery(&self, failure: FailedDelivery) -> Result<()> {
        let _guard = self.list_lock.lock().await;
        let mut failures: Vec<FailedDelivery> = self.read_list(FAILED_DELIVERIES_KEY).await?;
        failures.retain(|f| f.alarm_id != failure.alarm_id);
        failures.push(failure);
        self.write_value(FAILED_DELIVERIES_KEY, &failures).await
    }

    /// Returns whether an entry existed.
    pub async fn remove_failed_delivery(&self, alarm_id: &str) -> Result<bool> {
        let _guard = self.list_lock.lock().await;
        let mut failures: Vec<FailedDelivery> = self.read_list(FAILED_DELIVERIES_KEY).await?;
        let before = failures.len();
        failures.retain(|f| f.alarm_id != alarm_id);
        if failures.len() == before {
            return Ok(false);
        }
        self.write_value(FAILED_DELIVERIES_KEY, &failures).await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Auth session
    // ------------------------------------------------------------------

    pub async fn auth_session(&self) -> Result<Option<TokenSet>> {
        self.read_value(AUTH_SESSION_KEY).await
    }

    pub async fn save_auth_session(&self, tokens: &TokenSet) -> Result<()> {
        self.write_value(AUTH_SESSION_KEY, tokens).await
    }

    pub async fn clear_auth_session(&self) -> Result<()> {
        self.kv.remove(AUTH_SESSION_KEY).await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.kv.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.read_value(key).await?.unwrap_or_default())
    }

    async fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value)
            .map_err(|e| FeedminderError::Internal(format!("failed to serialize {key}: {e}")))?;
        self.kv.set(vec![(key.to_string(), json)]).await
    }
}
