//! Calendar delivery client

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use feedminder_domain::constants::OP_CREATE_CALENDAR_EVENT;
use feedminder_domain::{
    CalendarEventCreated, CalendarEventRequest, DeliveryConfig, EventDateTime, EventReminders,
    FeedminderError, ReminderOverride, Result,
};
use tracing::{info, instrument};

use super::ports::CalendarApi;
use super::retry::RetryingExecutor;

/// Creates reminder events on the primary Google Calendar.
#[derive(Clone)]
pub struct CalendarDeliveryClient {
    api: Arc<dyn CalendarApi>,
    retry: RetryingExecutor,
    event_duration: Duration,
    reminder_lead_minutes: u32,
}

impl CalendarDeliveryClient {
    /// Event length and reminder lead time come from `config`.
    pub fn new(api: Arc<dyn CalendarApi>, retry: RetryingExecutor, config: &DeliveryConfig) -> Self {
        Self {
            api,
            retry,
            event_duration: Duration::minutes(config.event_duration_minutes),
            reminder_lead_minutes: config.reminder_lead_minutes,
        }
    }

    /// Event spanning `[start, start + duration)` with email and popup
    /// reminders ahead of the start.
    pub fn build_event(
        &self,
        title: &str,
        description: &str,
        start: DateTime<Utc>,
    ) -> CalendarEventRequest {
        let end = start + self.event_duration;
        let reminder = |method: &str| ReminderOverride {
            method: method.to_string(),
            minutes: self.reminder_lead_minutes,
        };

        CalendarEventRequest {
            summary: title.to_string(),
            description: description.to_string(),
            start: EventDateTime { date_time: start.to_rfc3339_opts(SecondsFormat::Millis, true) },
            end: EventDateTime { date_time: end.to_rfc3339_opts(SecondsFormat::Millis, true) },
            reminders: EventReminders {
                use_default: false,
                overrides: vec![reminder("email"), reminder("popup")],
            },
        }
    }

    /// Create the event, retrying per the delivery policy. Exhaustion yields
    /// `CalendarDeliveryFailed`.
    #[instrument(skip(self, token, description))]
    pub async fn create_event(
        &self,
        token: &str,
        title: &str,
        description: &str,
        start: DateTime<Utc>,
    ) -> Result<CalendarEventCreated> {
        let event = self.build_event(title, description, start);
        let api = self.api.as_ref();
        let event_ref = &event;

        let created = self
            .retry
            .with_retry(OP_CREATE_CALENDAR_EVENT, move || api.insert_event(token, event_ref))
            .await
            .map_err(|failure| FeedminderError::CalendarDeliveryFailed {
                attempts: failure.attempts,
                message: failure.error.to_string(),
            })?;

        info!(event_id = ?created.id, "calendar event created");
        Ok(created)
    }
}
