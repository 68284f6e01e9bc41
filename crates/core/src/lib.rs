//! # Feedminder Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, alarms, identity and the
//!   delivery APIs
//! - Typed access to persisted state
//! - The scheduling, dispatch, identity and diagnostics services
//!
//! ## Architecture Principles
//! - Only depends on `feedminder-common` and `feedminder-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod alarms;
pub mod delivery;
pub mod diagnostics;
pub mod identity;
pub mod scheduling;
pub mod storage;

// Infrastructure ports
pub mod clock_ports;

pub use alarms::{AlarmClock, AlarmDispatcher, DispatchOutcome};
pub use clock_ports::{Clock, SystemClock};
pub use delivery::{
    CalendarApi, CalendarDeliveryClient, MailApi, MailDeliveryClient, RetryFailure,
    RetryingExecutor,
};
pub use diagnostics::DiagnosticsService;
pub use identity::{IdentityGateway, IdentityProvider, ProfileApi};
pub use scheduling::ReminderScheduler;
pub use storage::{KeyValueStore, ReminderStore};
