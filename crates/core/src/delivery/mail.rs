//! Mail delivery client
//!
//! Sends a plain-text self-addressed message through the mail API's raw
//! submission endpoint.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use feedminder_domain::constants::OP_SEND_GMAIL_RAW;
use feedminder_domain::{EmailPayload, FeedminderError, MailSendReceipt, Result, UserProfile};
use tracing::{info, instrument, warn};

use super::ports::MailApi;
use super::retry::RetryingExecutor;
use crate::identity::IdentityGateway;

/// Sends reminder emails to the signed-in account through Gmail.
#[derive(Clone)]
pub struct MailDeliveryClient {
    identity: IdentityGateway,
    api: Arc<dyn MailApi>,
    retry: RetryingExecutor,
}

impl MailDeliveryClient {
    /// Create a client resolving tokens and recipients through `identity`.
    pub fn new(identity: IdentityGateway, api: Arc<dyn MailApi>, retry: RetryingExecutor) -> Self {
        Self { identity, api, retry }
    }

    /// Deliver `payload` to the signed-in user.
    ///
    /// Fails with `NotAuthenticated` when no token can be obtained (not
    /// retried) and with `MailDeliveryFailed` once sending is exhausted.
    #[instrument(skip_all)]
    pub async fn send(&self, payload: &EmailPayload) -> Result<MailSendReceipt> {
        let token = self.resolve_token().await?;
        let profile = self.identity.fetch_user_info(&token).await?;
        let raw = encode_raw_message(&build_mime_message(&profile, payload));

        let api = self.api.as_ref();
        let token_ref = token.as_str();
        let raw_ref = raw.as_str();

        let receipt = self
            .retry
            .with_retry(OP_SEND_GMAIL_RAW, move || api.send_raw(token_ref, raw_ref))
            .await
            .map_err(|failure| FeedminderError::MailDeliveryFailed {
                attempts: failure.attempts,
                message: failure.error.to_string(),
            })?;

        info!(message_id = ?receipt.id, "reminder email sent");
        Ok(receipt)
    }

    async fn resolve_token(&self) -> Result<String> {
        if let Ok(token) = self.identity.get_auth_token(false).await {
            return Ok(token);
        }
        match self.identity.get_auth_token(true).await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!(error = %e, "no token available for mail delivery");
                Err(FeedminderError::NotAuthenticated)
            }
        }
    }
}

/// RFC 2822 message addressed from and to the user, CRLF line endings.
pub fn build_mime_message(profile: &UserProfile, payload: &EmailPayload) -> String {
    let body = payload.body.replace("\r\n", "\n").replace('\n', "\r\n");
    [
        format!("From: {}", profile.mailbox()),
        format!("To: {}", profile.email),
        format!("Subject: {}", encode_subject(&payload.subject)),
        "Content-Type: text/plain; charset=\"UTF-8\"".to_string(),
        String::new(),
        body,
    ]
    .join("\r\n")
}

/// URL-safe base64 without padding, as required for raw submission.
pub fn encode_raw_message(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

// Header values must stay on one line; non-ASCII goes out as an RFC 2047
// encoded word.
fn encode_subject(subject: &str) -> String {
    let single_line: String =
        subject.chars().map(|c| if c == '\r' || c == '\n' { ' ' } else { c }).collect();
    if single_line.is_ascii() {
        single_line
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(single_line.as_bytes()))
    }
}
