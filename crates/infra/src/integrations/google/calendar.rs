//! Google Calendar v3 event insertion.

use async_trait::async_trait;
use feedminder_core::CalendarApi;
use feedminder_domain::{CalendarEventCreated, CalendarEventRequest, Result};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// `CalendarApi` posting to `{base}/calendars/primary/events`.
pub struct GoogleCalendarClient {
    http: HttpClient,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http: HttpClient, api_base: impl Into<String>) -> Self {
        Self { http, api_base: api_base.into() }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/primary/events", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    #[instrument(skip_all)]
    async fn insert_event(
        &self,
        token: &str,
        event: &CalendarEventRequest,
    ) -> Result<CalendarEventCreated> {
        let request = self.http.request(Method::POST, self.events_url()).bearer_auth(token).json(event);

        let created: CalendarEventCreated = self.http.send_json(request).await?;
        debug!(event_id = ?created.id, "calendar event created");
        Ok(created)
    }
}
