//! In-memory fakes for every core port.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use feedminder_core::{AlarmClock, CalendarApi, Clock, IdentityProvider, KeyValueStore, MailApi, ProfileApi};
use feedminder_domain::{
    Alarm, CalendarEventCreated, CalendarEventRequest, FeedminderError, MailSendReceipt,
    Result as DomainResult, UserProfile,
};
use serde_json::Value;

/// `HashMap`-backed `KeyValueStore`.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    unreadable: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Make every `get` of `key` fail, as a broken backing store would.
    pub fn fail_reads_of(&self, key: &str) {
        *self.unreadable.lock().unwrap() = Some(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<_> =
            self.entries.lock().unwrap().keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DomainResult<Option<Value>> {
        if self.unreadable.lock().unwrap().as_deref() == Some(key) {
            return Err(FeedminderError::Database(format!("cannot read {key}")));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> DomainResult<()> {
        self.entries.lock().unwrap().extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        self.delete(key);
        Ok(())
    }
}

/// `BTreeMap`-backed `AlarmClock`.
#[derive(Default)]
pub struct MemoryAlarms {
    alarms: Mutex<BTreeMap<String, i64>>,
}

impl MemoryAlarms {
    pub fn names(&self) -> Vec<String> {
        self.alarms.lock().unwrap().keys().cloned().collect()
    }

    pub fn fire_time(&self, name: &str) -> Option<i64> {
        self.alarms.lock().unwrap().get(name).copied()
    }

    pub fn wipe(&self) {
        self.alarms.lock().unwrap().clear();
    }
}

#[async_trait]
impl AlarmClock for MemoryAlarms {
    async fn create(&self, name: &str, fire_at_ms: i64) -> DomainResult<()> {
        self.alarms.lock().unwrap().insert(name.to_string(), fire_at_ms);
        Ok(())
    }

    async fn clear(&self, name: &str) -> DomainResult<bool> {
        Ok(self.alarms.lock().unwrap().remove(name).is_some())
    }

    async fn get(&self, name: &str) -> DomainResult<Option<Alarm>> {
        Ok(self
            .fire_time(name)
            .map(|scheduled_time| Alarm { name: name.to_string(), scheduled_time }))
    }

    async fn get_all(&self) -> DomainResult<Vec<Alarm>> {
        Ok(self
            .alarms
            .lock()
            .unwrap()
            .iter()
            .map(|(name, at)| Alarm { name: name.clone(), scheduled_time: *at })
            .collect())
    }

    async fn take_due(&self, now_ms: i64) -> DomainResult<Vec<Alarm>> {
        let mut alarms = self.alarms.lock().unwrap();
        let due: Vec<Alarm> = alarms
            .iter()
            .filter(|(_, at)| **at <= now_ms)
            .map(|(name, at)| Alarm { name: name.clone(), scheduled_time: *at })
            .collect();
        for alarm in &due {
            alarms.remove(&alarm.name);
        }
        Ok(due)
    }
}

/// Identity provider with scripted silent/interactive tokens.
pub struct FakeIdentity {
    silent: Mutex<Option<String>>,
    interactive: Mutex<Option<String>>,
    pub interactive_calls: AtomicU32,
    pub removed: Mutex<Vec<String>>,
    pub revoked: Mutex<Vec<String>>,
    revoke_fails: bool,
}

impl FakeIdentity {
    pub fn signed_in(token: &str) -> Self {
        Self {
            silent: Mutex::new(Some(token.to_string())),
            interactive: Mutex::new(Some(token.to_string())),
            interactive_calls: AtomicU32::new(0),
            removed: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
            revoke_fails: false,
        }
    }

    pub fn signed_out() -> Self {
        Self { silent: Mutex::new(None), interactive: Mutex::new(None), ..Self::signed_in("") }
    }

    /// No cached session, but an interactive prompt would succeed.
    pub fn needs_prompt(token: &str) -> Self {
        Self { silent: Mutex::new(None), ..Self::signed_in(token) }
    }

    pub fn with_failing_revoke(mut self) -> Self {
        self.revoke_fails = true;
        self
    }

    pub fn interactive_calls(&self) -> u32 {
        self.interactive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_auth_token(&self, interactive: bool) -> DomainResult<String> {
        if interactive {
            self.interactive_calls.fetch_add(1, Ordering::SeqCst);
            let token = self.interactive.lock().unwrap().clone();
            let token = token.ok_or_else(|| FeedminderError::AuthDenied("user declined".into()))?;
            *self.silent.lock().unwrap() = Some(token.clone());
            Ok(token)
        } else {
            self.silent.lock().unwrap().clone().ok_or(FeedminderError::AuthUnavailable)
        }
    }

    async fn remove_cached_token(&self, token: &str) -> DomainResult<()> {
        self.removed.lock().unwrap().push(token.to_string());
        *self.silent.lock().unwrap() = None;
        Ok(())
    }

    async fn clear_session(&self) -> DomainResult<Option<String>> {
        Ok(self.silent.lock().unwrap().take())
    }

    async fn revoke_token(&self, token: &str) -> DomainResult<()> {
        self.revoked.lock().unwrap().push(token.to_string());
        if self.revoke_fails {
            Err(FeedminderError::Network("revoke endpoint unreachable".into()))
        } else {
            Ok(())
        }
    }
}

/// Profile API returning a fixed profile, or failing when unset.
pub struct FakeProfiles {
    profile: Mutex<Option<UserProfile>>,
    pub calls: AtomicU32,
}

impl FakeProfiles {
    pub fn returning(profile: UserProfile) -> Self {
        Self { profile: Mutex::new(Some(profile)), calls: AtomicU32::new(0) }
    }

    pub fn failing() -> Self {
        Self { profile: Mutex::new(None), calls: AtomicU32::new(0) }
    }

    pub fn set(&self, profile: Option<UserProfile>) {
        *self.profile.lock().unwrap() = profile;
    }
}

#[async_trait]
impl ProfileApi for FakeProfiles {
    async fn fetch_user_info(&self, _token: &str) -> DomainResult<UserProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FeedminderError::ProfileFetchFailed("HTTP 401".into()))
    }
}

/// Calendar API that fails a configurable number of times first.
#[derive(Default)]
pub struct ScriptedCalendar {
    failures_left: AtomicU32,
    pub calls: AtomicU32,
    pub events: Mutex<Vec<CalendarEventRequest>>,
}

impl ScriptedCalendar {
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarApi for ScriptedCalendar {
    async fn insert_event(
        &self,
        _token: &str,
        event: &CalendarEventRequest,
    ) -> DomainResult<CalendarEventCreated> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if take_failure(&self.failures_left) {
            return Err(FeedminderError::Http {
                status: 503,
                message: format!("calendar unavailable (call {call})"),
            });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(CalendarEventCreated { id: Some(format!("evt{call}")), ..Default::default() })
    }
}

/// Mail API that fails a configurable number of times first.
#[derive(Default)]
pub struct ScriptedMail {
    failures_left: AtomicU32,
    pub calls: AtomicU32,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl ScriptedMail {
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailApi for ScriptedMail {
    async fn send_raw(&self, token: &str, raw: &str) -> DomainResult<MailSendReceipt> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if take_failure(&self.failures_left) {
            return Err(FeedminderError::Http {
                status: 500,
                message: format!("gmail error (call {call})"),
            });
        }
        self.sent.lock().unwrap().push((token.to_string(), raw.to_string()));
        Ok(MailSendReceipt { id: Some(format!("msg{call}")), thread_id: None })
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

/// Manually advanced clock.
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub fn at(now_ms: i64) -> Arc<Self> {
        Arc::new(Self { now_ms: AtomicI64::new(now_ms) })
    }

    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
