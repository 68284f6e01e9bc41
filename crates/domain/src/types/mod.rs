//! Domain types and models

pub mod delivery;
pub mod diagnostics;
pub mod reminder;
pub mod user;

pub use delivery::{
    Alarm, CalendarEventCreated, CalendarEventRequest, EventDateTime, EventReminders,
    MailSendReceipt, ReminderOverride,
};
pub use diagnostics::{ErrorLogEntry, FailedDelivery, FailedReminder};
pub use reminder::{
    email_alarm_id, is_email_alarm, CalendarOutcome, EmailOutcome, EmailPayload, ImmediateDelivery,
    ReminderRecord, ReminderRequest, ReminderType, ScheduleOutcome, ScheduledEmail,
};
pub use user::UserProfile;
