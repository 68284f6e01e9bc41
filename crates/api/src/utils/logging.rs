use std::time::Duration;

use feedminder_domain::FeedminderError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the log format (`json` or anything else for
/// human-readable output).
pub const LOG_FORMAT_ENV: &str = "FEEDMINDER_LOG_FORMAT";

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). Output goes to stderr;
/// stdout carries responses. Calling this twice is harmless: the second
/// install fails and is ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|value| value.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).try_init()
    };

    if installed.is_ok() {
        info!(json, "tracing initialized");
    }
}

/// Log the outcome of a request with structured fields.
///
/// `command` is the request's action name; callers must not forward tokens or
/// message bodies.
#[inline]
pub fn log_command_execution(command: &str, request_id: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, request_id, duration_ms, "command_execution_success");
    } else {
        warn!(command, request_id, duration_ms, "command_execution_failure");
    }
}

/// Convert a `FeedminderError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &FeedminderError) -> &'static str {
    match error {
        FeedminderError::AuthUnavailable => "auth_unavailable",
        FeedminderError::AuthDenied(_) => "auth_denied",
        FeedminderError::ProfileFetchFailed(_) => "profile_fetch_failed",
        FeedminderError::CalendarDeliveryFailed { .. } => "calendar_delivery_failed",
        FeedminderError::MailDeliveryFailed { .. } => "mail_delivery_failed",
        FeedminderError::NotAuthenticated => "not_authenticated",
        FeedminderError::Network(_) => "network",
        FeedminderError::Http { .. } => "http",
        FeedminderError::Database(_) => "database",
        FeedminderError::Config(_) => "config",
        FeedminderError::InvalidInput(_) => "invalid_input",
        FeedminderError::NotFound(_) => "not_found",
        FeedminderError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_labels_are_stable() {
        assert_eq!(error_label(&FeedminderError::NotAuthenticated), "not_authenticated");
        assert_eq!(
            error_label(&FeedminderError::MailDeliveryFailed { attempts: 3, message: "x".into() }),
            "mail_delivery_failed"
        );
        assert_eq!(error_label(&FeedminderError::Http { status: 500, message: String::new() }), "http");
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
