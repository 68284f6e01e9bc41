//! Diagnostic listings over persisted state

pub mod service;

pub use service::DiagnosticsService;
