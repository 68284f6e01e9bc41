//! Delivery clients for calendar events and reminder emails

pub mod calendar;
pub mod mail;
pub mod ports;
pub mod retry;

pub use calendar::CalendarDeliveryClient;
pub use mail::{build_mime_message, encode_raw_message, MailDeliveryClient};
pub use ports::{CalendarApi, MailApi};
pub use retry::{RetryFailure, RetryingExecutor};
