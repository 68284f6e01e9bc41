//! Diagnostics: error log and retained failed deliveries

use feedminder_domain::{ErrorLogEntry, FailedReminder, Result};
use tracing::{info, instrument};

use crate::storage::ReminderStore;

/// Read and housekeeping access to the error log and failed deliveries.
#[derive(Clone)]
pub struct DiagnosticsService {
    store: ReminderStore,
}

impl DiagnosticsService {
    pub fn new(store: ReminderStore) -> Self {
        Self { store }
    }

    /// Error log, oldest first.
    pub async fn list_error_logs(&self) -> Result<Vec<ErrorLogEntry>> {
        self.store.error_logs().await
    }

    #[instrument(skip(self))]
    pub async fn clear_error_logs(&self) -> Result<()> {
        self.store.clear_error_logs().await?;
        info!("error log cleared");
        Ok(())
    }

    /// Failed deliveries with their retained payloads.
    pub async fn list_failed_reminders(&self) -> Result<Vec<FailedReminder>> {
        let failures = self.store.failed_deliveries().await?;
        let mut listed = Vec::with_capacity(failures.len());
        for delivery in failures {
            let payload = self.store.email_payload(&delivery.alarm_id).await?;
            listed.push(FailedReminder { delivery, payload });
        }
        Ok(listed)
    }

    /// Drop a failed delivery and its retained payload. Idempotent.
    ///
    /// The payload is left alone while the alarm id still has a pending
    /// record.
    #[instrument(skip(self))]
    pub async fn purge_failed_reminder(&self, alarm_id: &str) -> Result<()> {
        let removed = self.store.remove_failed_delivery(alarm_id).await?;
        let still_pending = self.store.reminders().await?.iter().any(|r| r.alarm_id == alarm_id);
        if !still_pending {
            self.store.remove_email_payload(alarm_id).await?;
        }
        info!(alarm_id, removed, "failed reminder purged");
        Ok(())
    }
}
