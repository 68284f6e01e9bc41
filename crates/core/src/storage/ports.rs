//! Port interface for the durable key-value store
//!
//! Every piece of persisted state (profile, pending reminders, payloads,
//! diagnostics, auth session) lives behind this trait.

use async_trait::async_trait;
use feedminder_domain::Result;
use serde_json::Value;

/// Process-wide persisted mapping from string key to JSON value.
///
/// Each call commits independently; there is no transaction spanning
/// multiple calls.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write one or more entries, replacing existing values
    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
