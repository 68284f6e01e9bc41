//! # Feedminder App
//!
//! Application layer - request handling and main entry point.
//!
//! This crate contains:
//! - The JSON message envelope (panel/page → background bridge)
//! - Application context (dependency injection)
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Serves newline-delimited JSON requests from the `feedminder` binary

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::{handle_line, handle_request, BackgroundRequest, BackgroundResponse};
pub use context::AppContext;
