//! Errors raised by the alarm sweep lifecycle

use feedminder_domain::FeedminderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("alarm sweep already running")]
    AlreadyRunning,

    #[error("alarm sweep not running")]
    NotRunning,

    /// The cron expression was rejected when building the job
    #[error("invalid sweep schedule {expression:?}: {message}")]
    InvalidSchedule { expression: String, message: String },

    /// The underlying job scheduler failed at `stage`
    #[error("job scheduler failed to {stage}: {message}")]
    Scheduler { stage: &'static str, message: String },

    #[error("alarm sweep {stage} timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },
}

impl From<SweepError> for FeedminderError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::InvalidSchedule { .. } => Self::Config(err.to_string()),
            SweepError::AlreadyRunning | SweepError::NotRunning => Self::InvalidInput(err.to_string()),
            SweepError::Scheduler { .. } | SweepError::Timeout { .. } => Self::Internal(err.to_string()),
        }
    }
}

pub type SweepResult<T> = Result<T, SweepError>;
