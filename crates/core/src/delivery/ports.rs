//! Port interfaces for the remote delivery services
//!
//! Implementations perform exactly one HTTP call per invocation; retrying is
//! the delivery clients' job.

use async_trait::async_trait;
use feedminder_domain::{CalendarEventCreated, CalendarEventRequest, MailSendReceipt, Result};

#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Insert an event into the primary calendar
    async fn insert_event(
        &self,
        token: &str,
        event: &CalendarEventRequest,
    ) -> Result<CalendarEventCreated>;
}

#[async_trait]
pub trait MailApi: Send + Sync {
    /// Submit a base64url-encoded RFC 2822 message
    async fn send_raw(&self, token: &str, raw: &str) -> Result<MailSendReceipt>;
}
