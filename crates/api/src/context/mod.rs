//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use feedminder_core::{
    AlarmClock, AlarmDispatcher, CalendarDeliveryClient, Clock, DiagnosticsService,
    IdentityGateway, KeyValueStore, MailDeliveryClient, ReminderScheduler, ReminderStore,
    RetryingExecutor, SystemClock,
};
use feedminder_domain::{Config, FeedminderError, Result};
use feedminder_infra::scheduling::SweepJob;
use feedminder_infra::{
    AlarmSweepConfig, AlarmSweepScheduler, AuthorizationPrompt, DbManager, GmailClient,
    GoogleCalendarClient, GoogleIdentityProvider, GoogleUserInfoClient, HttpClient, LoggingPrompt,
    SqliteAlarmClock, SqliteKeyValueStore,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub store: ReminderStore,
    pub identity: IdentityGateway,
    pub scheduler: ReminderScheduler,
    pub dispatcher: Arc<AlarmDispatcher>,
    pub diagnostics: DiagnosticsService,

    sweep: Mutex<AlarmSweepScheduler>,
}

impl AppContext {
    /// Create a context that shows authorization URLs through the log.
    pub async fn new(config: Config) -> Result<Self> {
        Self::new_with_prompt(config, Arc::new(LoggingPrompt)).await
    }

    /// Create a context with a custom authorization prompt.
    ///
    /// Opens (and migrates) the SQLite database named in the config and wires
    /// the Google adapters. Nothing runs in the background until
    /// [`AppContext::start_background`].
    pub async fn new_with_prompt(
        config: Config,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(db.clone()));
        let alarms: Arc<dyn AlarmClock> = Arc::new(SqliteAlarmClock::new(db.clone()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = ReminderStore::new(kv)
            .with_error_log_limit(config.diagnostics.max_error_log_entries);

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.delivery.request_timeout_secs))
            .build()?;

        let provider = GoogleIdentityProvider::new(
            &config.google,
            &config.auth,
            &http,
            store.clone(),
            prompt,
        )?;
        let profiles = GoogleUserInfoClient::new(http.clone(), &config.google.userinfo_endpoint);
        let identity = IdentityGateway::new(Arc::new(provider), Arc::new(profiles), store.clone());

        let retry = RetryingExecutor::from_config(store.clone(), clock.clone(), &config.delivery);
        let calendar = CalendarDeliveryClient::new(
            Arc::new(GoogleCalendarClient::new(http.clone(), &config.google.calendar_api_base)),
            retry.clone(),
            &config.delivery,
        );
        let mail = MailDeliveryClient::new(
            identity.clone(),
            Arc::new(GmailClient::new(http, &config.google.gmail_api_base)),
            retry,
        );

        let scheduler = ReminderScheduler::new(
            identity.clone(),
            calendar,
            mail.clone(),
            alarms.clone(),
            store.clone(),
            clock.clone(),
            config.delivery.immediate_threshold_ms,
        );
        let dispatcher = Arc::new(AlarmDispatcher::new(store.clone(), mail, alarms, clock));
        let diagnostics = DiagnosticsService::new(store.clone());

        let sweep_job: Arc<dyn SweepJob> = dispatcher.clone();
        let sweep = AlarmSweepScheduler::with_config(AlarmSweepConfig::from(&config.alarms), sweep_job)
            .map_err(FeedminderError::from)?;

        info!(db = %db.path().display(), "application context created");

        Ok(Self {
            config,
            db,
            store,
            identity,
            scheduler,
            dispatcher,
            diagnostics,
            sweep: Mutex::new(sweep),
        })
    }

    /// Re-register missing alarms, then start the alarm sweep.
    ///
    /// Returns how many alarms were restored.
    pub async fn start_background(&self) -> Result<usize> {
        let restored = self.scheduler.restore_alarms().await?;
        if restored > 0 {
            info!(restored, "re-registered alarms for pending reminders");
        }

        let mut sweep = self.sweep.lock().await;
        if !sweep.is_running() {
            sweep.start().await.map_err(FeedminderError::from)?;
        }
        Ok(restored)
    }

    pub async fn sweep_running(&self) -> bool {
        self.sweep.lock().await.is_running()
    }

    /// Stop the alarm sweep. Safe to call more than once.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        let mut sweep = self.sweep.lock().await;
        if sweep.is_running() {
            if let Err(e) = sweep.stop().await {
                warn!(error = %e, "alarm sweep did not stop cleanly");
                return Err(e.into());
            }
        }
        Ok(())
    }
}
