//! Port interface for the wall-clock alarm facility

use async_trait::async_trait;
use feedminder_domain::{Alarm, Result};

/// Durable named alarms keyed by an opaque id.
///
/// Alarms carry no payload. Anything needed when an alarm fires must already
/// be in the key-value store under the alarm name.
#[async_trait]
pub trait AlarmClock: Send + Sync {
    /// Register an alarm, replacing any alarm with the same name
    async fn create(&self, name: &str, fire_at_ms: i64) -> Result<()>;

    /// Remove an alarm. Returns whether one existed.
    async fn clear(&self, name: &str) -> Result<bool>;

    async fn get(&self, name: &str) -> Result<Option<Alarm>>;

    async fn get_all(&self) -> Result<Vec<Alarm>>;

    /// Remove and return every alarm due at or before `now_ms`
    async fn take_due(&self, now_ms: i64) -> Result<Vec<Alarm>>;
}
