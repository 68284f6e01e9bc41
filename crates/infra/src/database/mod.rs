//! SQLite persistence: the durable key-value store and the alarm table.

pub mod alarm_store;
pub mod kv_store;
pub mod manager;

pub use alarm_store::SqliteAlarmClock;
pub use kv_store::SqliteKeyValueStore;
pub use manager::{DbManager, SqliteConnection};
