//! Reminder scheduling, listing, cancellation and alarm restoration

pub mod service;

pub use service::ReminderScheduler;
