//! Cron-driven alarm sweep.
//!
//! Periodically runs a [`SweepJob`], normally the core
//! [`AlarmDispatcher`], which drains due alarms from the persisted alarm
//! table and dispatches them. Join handles are tracked and cancellation is
//! explicit. Lifecycle calls are bounded by timeouts; a sweep that overruns
//! its timeout is only reported, never cancelled.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use feedminder_core::AlarmDispatcher;
//! use feedminder_infra::scheduling::{AlarmSweepConfig, AlarmSweepScheduler, SweepResult};
//!
//! # async fn example(dispatcher: AlarmDispatcher) -> SweepResult<()> {
//! let mut sweep = AlarmSweepScheduler::with_config(
//!     AlarmSweepConfig { cron_expression: "*/15 * * * * *".into(), ..Default::default() },
//!     Arc::new(dispatcher),
//! )?;
//!
//! sweep.start().await?;
//! // ... application runs ...
//! sweep.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use feedminder_core::AlarmDispatcher;
use feedminder_domain::AlarmConfig;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::InfraError;
use crate::scheduling::error::{SweepError, SweepResult};

/// One sweep over due alarms.
#[async_trait]
pub trait SweepJob: Send + Sync {
    /// Run the sweep; returns how many alarms were dispatched.
    async fn run(&self) -> Result<usize, InfraError>;
}

#[async_trait]
impl SweepJob for AlarmDispatcher {
    async fn run(&self) -> Result<usize, InfraError> {
        self.fire_due_alarms().await.map_err(InfraError::from)
    }
}

/// Configuration for the alarm sweep.
#[derive(Debug, Clone)]
pub struct AlarmSweepConfig {
    /// Cron expression (with seconds) describing the sweep cadence.
    pub cron_expression: String,
    /// Time after which a running sweep is reported as overdue.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for AlarmSweepConfig {
    fn default() -> Self {
        Self {
            cron_expression: "*/15 * * * * *".into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&AlarmConfig> for AlarmSweepConfig {
    fn from(config: &AlarmConfig) -> Self {
        Self {
            cron_expression: config.sweep_cron.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            ..Self::default()
        }
    }
}

/// Alarm sweep with explicit lifecycle management.
///
/// Each `start` builds a fresh `JobScheduler`; `stop` shuts it down, so the
/// sweep can be restarted.
pub struct AlarmSweepScheduler {
    config: AlarmSweepConfig,
    job: Arc<dyn SweepJob>,
    scheduler: Option<JobScheduler>,
    job_id: Option<Uuid>,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl AlarmSweepScheduler {
    /// Create a sweep with the given configuration.
    ///
    /// Fails with `InvalidSchedule` when the cron expression does not parse.
    pub fn with_config(config: AlarmSweepConfig, job: Arc<dyn SweepJob>) -> SweepResult<Self> {
        build_job(&config, job.clone())?;

        Ok(Self {
            config,
            job,
            scheduler: None,
            job_id: None,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
        })
    }

    /// Identifier of the registered cron job while running.
    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SweepResult<()> {
        if self.is_running() {
            return Err(SweepError::AlreadyRunning);
        }

        let start_timeout = self.config.start_timeout;
        let scheduler = tokio::time::timeout(start_timeout, JobScheduler::new())
            .await
            .map_err(|_| SweepError::Timeout { stage: "start", seconds: start_timeout.as_secs() })?
            .map_err(|e| SweepError::Scheduler { stage: "create", message: e.to_string() })?;

        let job = build_job(&self.config, self.job.clone())?;
        let job_id = scheduler
            .add(job)
            .await
            .map_err(|e| SweepError::Scheduler { stage: "register job", message: e.to_string() })?;

        tokio::time::timeout(start_timeout, scheduler.start())
            .await
            .map_err(|_| SweepError::Timeout { stage: "start", seconds: start_timeout.as_secs() })?
            .map_err(|e| SweepError::Scheduler { stage: "start", message: e.to_string() })?;

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("Alarm sweep monitor cancelled");
        }));

        self.scheduler = Some(scheduler);
        self.job_id = Some(job_id);
        info!(job_id = %job_id, "Alarm sweep started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SweepResult<()> {
        if !self.is_running() {
            return Err(SweepError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(mut scheduler) = self.scheduler.take() {
            let stop_timeout = self.config.stop_timeout;
            tokio::time::timeout(stop_timeout, scheduler.shutdown())
                .await
                .map_err(|_| SweepError::Timeout { stage: "stop", seconds: stop_timeout.as_secs() })?
                .map_err(|e| SweepError::Scheduler { stage: "stop", message: e.to_string() })?;
        }

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SweepError::Timeout { stage: "join", seconds: join_timeout.as_secs() })?
                .map_err(|e| SweepError::Scheduler { stage: "join monitor", message: e.to_string() })?;
        }

        self.job_id = None;
        info!("Alarm sweep stopped");
        Ok(())
    }

    /// Returns true when the monitor task is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

fn build_job(config: &AlarmSweepConfig, job: Arc<dyn SweepJob>) -> SweepResult<Job> {
    let job_timeout = config.job_timeout;

    Job::new_async(config.cron_expression.as_str(), move |_id, _lock| {
        let job = job.clone();

        Box::pin(async move {
            let started = Instant::now();
            // Due alarms are consumed before dispatch, so a slow sweep is
            // detached rather than dropped half way through reconciliation.
            let mut run = tokio::spawn(async move { job.run().await });

            match tokio::time::timeout(job_timeout, &mut run).await {
                Ok(Ok(Ok(0))) => {}
                Ok(Ok(Ok(fired))) => {
                    info!(fired, elapsed_ms = started.elapsed().as_millis(), "Alarm sweep dispatched reminders");
                }
                Ok(Ok(Err(err))) => {
                    error!(error = %err, "Alarm sweep failed");
                }
                Ok(Err(join_err)) => {
                    error!(error = %join_err, "Alarm sweep task panicked");
                }
                Err(_) => {
                    warn!(
                        timeout_secs = job_timeout.as_secs(),
                        "Alarm sweep exceeded its timeout; letting in-flight dispatch finish"
                    );
                }
            }
        })
    })
    .map_err(|e| SweepError::InvalidSchedule {
        expression: config.cron_expression.clone(),
        message: e.to_string(),
    })
}

impl Drop for AlarmSweepScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("AlarmSweepScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
