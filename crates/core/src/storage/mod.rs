//! Durable state: the key-value port and its typed wrapper

pub mod ports;
pub mod reminder_store;

pub use ports::KeyValueStore;
pub use reminder_store::ReminderStore;
