//! Request handling - panel/page to background bridge
//!
//! Every request is answered with an envelope; errors never escape as
//! anything other than `{ success: false, error }`.

mod envelope;

use std::time::Instant;

use feedminder_domain::{FeedminderError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub use envelope::{BackgroundRequest, BackgroundResponse};

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution};

/// Parse one JSON line, handle it and serialize the response.
pub async fn handle_line(ctx: &AppContext, line: &str) -> String {
    let response = match serde_json::from_str::<BackgroundRequest>(line) {
        Ok(request) => handle_request(ctx, request).await,
        Err(e) => {
            warn!(error = %e, "rejected malformed request");
            BackgroundResponse::failure(format!("Invalid request: {e}"))
        }
    };

    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"error":"failed to encode response: {e}"}}"#)
    })
}

/// Route a request to its service and wrap the outcome.
pub async fn handle_request(ctx: &AppContext, request: BackgroundRequest) -> BackgroundResponse {
    let command = request.action();
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();
    debug!(command, %request_id, "handling request");

    let result = dispatch(ctx, request).await;

    log_command_execution(command, &request_id, start.elapsed(), result.is_ok());
    result.unwrap_or_else(|e| {
        warn!(command, %request_id, error_type = error_label(&e), error = %e, "request failed");
        BackgroundResponse::failure(e.to_string())
    })
}

async fn dispatch(ctx: &AppContext, request: BackgroundRequest) -> Result<BackgroundResponse> {
    match request {
        BackgroundRequest::ScheduleReminder { data } => {
            let outcome = ctx.scheduler.schedule_reminder(&data).await?;
            Ok(BackgroundResponse::with_data(to_value(&outcome)?))
        }
        BackgroundRequest::SignIn => {
            let profile = ctx.identity.sign_in().await?;
            Ok(BackgroundResponse::with_profile(Some(&profile)))
        }
        BackgroundRequest::SignOut => {
            ctx.identity.sign_out().await;
            Ok(BackgroundResponse::ok())
        }
        BackgroundRequest::GetUser => {
            let profile = ctx.identity.get_user().await;
            Ok(BackgroundResponse::with_profile(profile.as_ref()))
        }
        BackgroundRequest::GetPendingReminders => {
            let reminders = ctx.scheduler.list_pending_reminders().await?;
            Ok(BackgroundResponse::with_reminders(reminders))
        }
        BackgroundRequest::CancelReminder { alarm_id } => {
            ctx.scheduler.cancel_reminder(&alarm_id).await?;
            Ok(BackgroundResponse::ok())
        }
        BackgroundRequest::GetErrorLogs => {
            let logs = ctx.diagnostics.list_error_logs().await?;
            Ok(BackgroundResponse::with_data(to_value(&logs)?))
        }
        BackgroundRequest::ClearErrorLogs => {
            ctx.diagnostics.clear_error_logs().await?;
            Ok(BackgroundResponse::ok())
        }
        BackgroundRequest::GetFailedReminders => {
            let failed = ctx.diagnostics.list_failed_reminders().await?;
            Ok(BackgroundResponse::with_data(to_value(&failed)?))
        }
        BackgroundRequest::PurgeFailedReminder { alarm_id } => {
            ctx.diagnostics.purge_failed_reminder(&alarm_id).await?;
            Ok(BackgroundResponse::ok())
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| FeedminderError::Internal(e.to_string()))
}
