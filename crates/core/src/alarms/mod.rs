//! Wall-clock alarms and the dispatcher that reacts to them

pub mod dispatcher;
pub mod ports;

pub use dispatcher::{AlarmDispatcher, DispatchOutcome};
pub use ports::AlarmClock;
