//! Gmail v1 raw message sending.

use async_trait::async_trait;
use feedminder_core::MailApi;
use feedminder_domain::{MailSendReceipt, Result};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// `MailApi` posting to `{base}/users/me/messages/send`.
pub struct GmailClient {
    http: HttpClient,
    api_base: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

impl GmailClient {
    pub fn new(http: HttpClient, api_base: impl Into<String>) -> Self {
        Self { http, api_base: api_base.into() }
    }

    fn send_url(&self) -> String {
        format!("{}/users/me/messages/send", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl MailApi for GmailClient {
    #[instrument(skip_all)]
    async fn send_raw(&self, token: &str, raw: &str) -> Result<MailSendReceipt> {
        let request = self
            .http
            .request(Method::POST, self.send_url())
            .bearer_auth(token)
            .json(&SendRequest { raw });

        let receipt: MailSendReceipt = self.http.send_json(request).await?;
        debug!(message_id = ?receipt.id, "message sent");
        Ok(receipt)
    }
}
