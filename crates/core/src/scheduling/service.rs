//! Reminder scheduling service - core business logic
//!
//! Classifies each request into immediate and deferred work. Deferred email
//! reminders are persisted in this order: payload, alarm, record. A crash
//! between steps can leave a payload without a record or an alarm without a
//! record; the dispatcher and [`ReminderScheduler::restore_alarms`] tolerate
//! both.

use std::sync::Arc;

use feedminder_domain::constants::ALARM_SUFFIX_LEN;
use feedminder_domain::{
    email_alarm_id, CalendarOutcome, EmailOutcome, ReminderRecord, ReminderRequest, ReminderType,
    Result, ScheduleOutcome,
};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::alarms::AlarmClock;
use crate::clock_ports::Clock;
use crate::delivery::{CalendarDeliveryClient, MailDeliveryClient};
use crate::identity::IdentityGateway;
use crate::storage::ReminderStore;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Reminder scheduling service
#[derive(Clone)]
pub struct ReminderScheduler {
    identity: IdentityGateway,
    calendar: CalendarDeliveryClient,
    mail: MailDeliveryClient,
    alarms: Arc<dyn AlarmClock>,
    store: ReminderStore,
    clock: Arc<dyn Clock>,
    immediate_threshold_ms: i64,
}

impl ReminderScheduler {
    /// Emails due within `immediate_threshold_ms` are sent inline.
    pub fn new(
        identity: IdentityGateway,
        calendar: CalendarDeliveryClient,
        mail: MailDeliveryClient,
        alarms: Arc<dyn AlarmClock>,
        store: ReminderStore,
        clock: Arc<dyn Clock>,
        immediate_threshold_ms: i64,
    ) -> Self {
        Self { identity, calendar, mail, alarms, store, clock, immediate_threshold_ms }
    }

    /// Schedule the calendar and/or email parts of a reminder.
    ///
    /// Calendar events are created right away. Emails due within the
    /// immediate threshold (or already past) are sent inline; later ones get
    /// an alarm and a pending record. Failures propagate unchanged.
    #[instrument(skip(self, request), fields(types = ?request.types))]
    pub async fn schedule_reminder(&self, request: &ReminderRequest) -> Result<ScheduleOutcome> {
        request.validate()?;
        let mut outcome = ScheduleOutcome::default();

        if request.wants(ReminderType::Calendar) {
            let token = self.identity.get_auth_token(true).await?;
            self.calendar
                .create_event(&token, &request.title, &request.description, request.start_time)
                .await?;
            outcome.calendar = Some(CalendarOutcome::Created);
        }

        if request.wants(ReminderType::Email) {
            let now = self.clock.now_ms();
            let scheduled_time = request.start_time.timestamp_millis();
            let delta = scheduled_time - now;

            if delta < self.immediate_threshold_ms {
                debug!(delta_ms = delta, "email due now, sending inline");
                self.mail.send(&request.email_payload()).await?;
                outcome.email = Some(EmailOutcome::sent_immediate());
            } else {
                let alarm_id = self.defer_email(request, now, scheduled_time).await?;
                outcome.email = Some(EmailOutcome::scheduled(alarm_id));
            }
        }

        Ok(outcome)
    }

    async fn defer_email(
        &self,
        request: &ReminderRequest,
        now: i64,
        scheduled_time: i64,
    ) -> Result<String> {
        let alarm_id = email_alarm_id(now, &random_suffix());

        self.store.save_email_payload(&alarm_id, &request.email_payload()).await?;
        self.alarms.create(&alarm_id, scheduled_time).await?;
        self.store
            .append_reminder(ReminderRecord {
                alarm_id: alarm_id.clone(),
                types: request.types.clone(),
                title: request.title.clone(),
                description: request.description.clone(),
                scheduled_time,
                created_at: now,
            })
            .await?;

        info!(alarm_id = %alarm_id, scheduled_time, "email reminder scheduled");
        Ok(alarm_id)
    }

    /// Pending deferred reminders, soonest first.
    pub async fn list_pending_reminders(&self) -> Result<Vec<ReminderRecord>> {
        let mut records = self.store.reminders().await?;
        records.sort_by_key(|r| (r.scheduled_time, r.created_at));
        Ok(records)
    }

    /// Clear the alarm, record and payload for `alarm_id`. Idempotent.
    #[instrument(skip(self))]
    pub async fn cancel_reminder(&self, alarm_id: &str) -> Result<()> {
        let had_alarm = self.alarms.clear(alarm_id).await?;
        let had_record = self.store.remove_reminder(alarm_id).await?;
        self.store.remove_email_payload(alarm_id).await?;
        info!(alarm_id, had_alarm, had_record, "reminder cancelled");
        Ok(())
    }

    /// Re-register alarms for pending records whose alarm is missing.
    ///
    /// Overdue records get an alarm at "now" so the next sweep fires them.
    /// Returns the number of alarms restored.
    #[instrument(skip(self))]
    pub async fn restore_alarms(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut restored = 0;

        for record in self.store.reminders().await? {
            if self.alarms.get(&record.alarm_id).await?.is_some() {
                continue;
            }
            let fire_at = record.scheduled_time.max(now);
            self.alarms.create(&record.alarm_id, fire_at).await?;
            if self.store.email_payload(&record.alarm_id).await?.is_none() {
                warn!(alarm_id = %record.alarm_id, "restored alarm has no stored payload");
            }
            restored += 1;
        }

        if restored > 0 {
            info!(restored, "re-registered missing alarms");
        }
        Ok(restored)
    }
}

/// Nine lowercase base-36 characters.
fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..ALARM_SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_nine_base36_chars() {
        for _ in 0..50 {
            let suffix = random_suffix();
            assert_eq!(suffix.len(), 9);
            assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn alarm_ids_are_fresh() {
        let a = email_alarm_id(1, &random_suffix());
        let b = email_alarm_id(1, &random_suffix());
        assert_ne!(a, b);
        assert!(a.starts_with("email_reminder_1_"));
    }
}
