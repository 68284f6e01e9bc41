//! Timer-fired dispatcher
//!
//! Runs when an email alarm reaches its deadline: looks up the payload,
//! delivers it and reconciles the persisted lists whatever the outcome.
//! Safe to invoke twice for the same alarm.

use std::sync::Arc;

use feedminder_domain::constants::OP_ALARM_NO_PAYLOAD;
use feedminder_domain::{is_email_alarm, ErrorLogEntry, FailedDelivery, Result};
use tracing::{debug, error, info, instrument, warn};

use super::ports::AlarmClock;
use crate::clock_ports::Clock;
use crate::delivery::MailDeliveryClient;
use crate::storage::ReminderStore;

/// What happened to a fired alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Email sent; payload and record removed
    Delivered,
    /// Delivery exhausted; record removed, payload retained
    Failed { error: String },
    /// Nothing stored for the alarm; stray record removed
    MissingPayload,
}

/// Delivers deferred email reminders when their alarms fire.
#[derive(Clone)]
pub struct AlarmDispatcher {
    store: ReminderStore,
    mail: MailDeliveryClient,
    alarms: Arc<dyn AlarmClock>,
    clock: Arc<dyn Clock>,
}

impl AlarmDispatcher {
    /// Create a dispatcher over the shared store and alarm facility.
    pub fn new(
        store: ReminderStore,
        mail: MailDeliveryClient,
        alarms: Arc<dyn AlarmClock>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, mail, alarms, clock }
    }

    /// Handle one fired alarm.
    #[instrument(skip(self))]
    pub async fn on_alarm(&self, alarm_id: &str) -> Result<DispatchOutcome> {
        let Some(payload) = self.store.email_payload(alarm_id).await? else {
            warn!(alarm_id, "alarm fired without a stored payload");
            self.store
                .append_error_log(ErrorLogEntry {
                    time: self.clock.now(),
                    operation: OP_ALARM_NO_PAYLOAD.to_string(),
                    attempts: 0,
                    error: format!("no payload stored for {alarm_id}"),
                })
                .await?;
            self.store.remove_reminder(alarm_id).await?;
            return Ok(DispatchOutcome::MissingPayload);
        };

        match self.mail.send(&payload).await {
            Ok(_) => {
                self.store.remove_email_payload(alarm_id).await?;
                self.store.remove_reminder(alarm_id).await?;
                info!(alarm_id, "deferred reminder delivered");
                Ok(DispatchOutcome::Delivered)
            }
            Err(e) => {
                error!(alarm_id, error = %e, "deferred reminder delivery failed");
                self.store.remove_reminder(alarm_id).await?;
                self.store
                    .append_failed_delivery(FailedDelivery {
                        alarm_id: alarm_id.to_string(),
                        subject: payload.subject.clone(),
                        failed_at: self.clock.now_ms(),
                        error: e.to_string(),
                    })
                    .await?;
                Ok(DispatchOutcome::Failed { error: e.to_string() })
            }
        }
    }

    /// Take every due alarm and dispatch the email reminders among them.
    ///
    /// One alarm's store failure does not stop the others, and its pending
    /// record is still dropped. Returns the number of alarms dispatched.
    #[instrument(skip(self))]
    pub async fn fire_due_alarms(&self) -> Result<usize> {
        let due = self.alarms.take_due(self.clock.now_ms()).await?;
        let mut dispatched = 0;

        for alarm in due {
            if !is_email_alarm(&alarm.name) {
                debug!(alarm = %alarm.name, "ignoring non-reminder alarm");
                continue;
            }
            match self.on_alarm(&alarm.name).await {
                Ok(outcome) => {
                    debug!(alarm_id = %alarm.name, ?outcome, "alarm dispatched");
                    dispatched += 1;
                }
                Err(e) => {
                    error!(alarm_id = %alarm.name, error = %e, "alarm dispatch failed");
                    // The alarm is already consumed; a surviving record would never fire.
                    if let Err(e) = self.store.remove_reminder(&alarm.name).await {
                        error!(alarm_id = %alarm.name, error = %e, "failed to drop pending record");
                    }
                }
            }
        }

        Ok(dispatched)
    }
}
