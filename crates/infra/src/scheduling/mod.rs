//! Scheduling infrastructure for automated task execution
//!
//! The alarm sweep follows the same runtime rules as every background task:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod alarm_sweep;
pub mod error;

pub use alarm_sweep::{AlarmSweepConfig, AlarmSweepScheduler, SweepJob};
pub use error::{SweepError, SweepResult};
