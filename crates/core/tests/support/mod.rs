//! Shared test helpers for `feedminder-core` integration tests.
//!
//! Wires every service against in-memory fakes with a pinned clock and a
//! one-millisecond retry delay.

#![allow(dead_code)]

pub mod fakes;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use feedminder_core::{
    AlarmDispatcher, CalendarDeliveryClient, DiagnosticsService, IdentityGateway,
    MailDeliveryClient, ReminderScheduler, ReminderStore, RetryingExecutor,
};
use feedminder_domain::{DeliveryConfig, ReminderRequest, ReminderType, UserProfile};

use self::fakes::{
    FakeIdentity, FakeProfiles, FixedClock, MemoryAlarms, MemoryStore, ScriptedCalendar,
    ScriptedMail,
};

/// 2023-11-14T22:13:20Z
pub const NOW_MS: i64 = 1_700_000_000_000;
pub const TOKEN: &str = "ya29.test-token";

pub fn profile() -> UserProfile {
    UserProfile {
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        picture: Some("https://example.com/grace.png".into()),
    }
}

pub fn request(types: &[ReminderType], title: &str, start_ms: i64) -> ReminderRequest {
    ReminderRequest {
        types: types.iter().copied().collect::<BTreeSet<_>>(),
        title: title.to_string(),
        description: format!("{title} description"),
        start_time: DateTime::from_timestamp_millis(start_ms).unwrap(),
    }
}

pub struct Harness {
    pub kv: Arc<MemoryStore>,
    pub alarms: Arc<MemoryAlarms>,
    pub identity: Arc<FakeIdentity>,
    pub profiles: Arc<FakeProfiles>,
    pub calendar_api: Arc<ScriptedCalendar>,
    pub mail_api: Arc<ScriptedMail>,
    pub clock: Arc<FixedClock>,
    pub store: ReminderStore,
    pub gateway: IdentityGateway,
    pub scheduler: ReminderScheduler,
    pub dispatcher: AlarmDispatcher,
    pub diagnostics: DiagnosticsService,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(FakeIdentity::signed_in(TOKEN), FakeProfiles::returning(profile()), 3, None)
    }

    pub fn with_identity(identity: FakeIdentity, profiles: FakeProfiles) -> Self {
        Self::build(identity, profiles, 3, None)
    }

    pub fn with_retries(retries: u32) -> Self {
        Self::build(FakeIdentity::signed_in(TOKEN), FakeProfiles::returning(profile()), retries, None)
    }

    pub fn with_error_log_limit(limit: usize) -> Self {
        Self::build(
            FakeIdentity::signed_in(TOKEN),
            FakeProfiles::returning(profile()),
            3,
            Some(limit),
        )
    }

    fn build(
        identity: FakeIdentity,
        profiles: FakeProfiles,
        retries: u32,
        error_log_limit: Option<usize>,
    ) -> Self {
        let kv = Arc::new(MemoryStore::default());
        let alarms = Arc::new(MemoryAlarms::default());
        let identity = Arc::new(identity);
        let profiles = Arc::new(profiles);
        let calendar_api = Arc::new(ScriptedCalendar::default());
        let mail_api = Arc::new(ScriptedMail::default());
        let clock = FixedClock::at(NOW_MS);

        let store = ReminderStore::new(kv.clone()).with_error_log_limit(error_log_limit);
        let retry = RetryingExecutor::new(store.clone(), clock.clone(), retries, Duration::from_millis(1));
        let gateway = IdentityGateway::new(identity.clone(), profiles.clone(), store.clone());
        let delivery = DeliveryConfig::default();
        let calendar = CalendarDeliveryClient::new(calendar_api.clone(), retry.clone(), &delivery);
        let mail = MailDeliveryClient::new(gateway.clone(), mail_api.clone(), retry);

        let scheduler = ReminderScheduler::new(
            gateway.clone(),
            calendar,
            mail.clone(),
            alarms.clone(),
            store.clone(),
            clock.clone(),
            delivery.immediate_threshold_ms,
        );
        let dispatcher = AlarmDispatcher::new(store.clone(), mail, alarms.clone(), clock.clone());
        let diagnostics = DiagnosticsService::new(store.clone());

        Self {
            kv,
            alarms,
            identity,
            profiles,
            calendar_api,
            mail_api,
            clock,
            store,
            gateway,
            scheduler,
            dispatcher,
            diagnostics,
        }
    }
}
