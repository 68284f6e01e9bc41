//! Shared helpers for `feedminder-app` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use feedminder_common::auth::TokenSet;
use feedminder_domain::{Config, FeedminderError, Result};
use feedminder_infra::AuthorizationPrompt;
use feedminder_lib::{handle_line, AppContext};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "ya29.app-test";

/// Prompt for tests that must never reach interactive authorization.
pub struct RefusingPrompt;

#[async_trait]
impl AuthorizationPrompt for RefusingPrompt {
    async fn present(&self, _authorization_url: &str) -> Result<()> {
        Err(FeedminderError::AuthDenied("no browser in tests".into()))
    }
}

/// Application context over a temporary database with every Google endpoint
/// pointed at a mock server.
pub struct TestApp {
    pub ctx: AppContext,
    pub server: MockServer,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Signed-in app: a valid session is stored and userinfo answers.
    pub async fn signed_in() -> Self {
        let app = Self::signed_out().await;
        app.ctx
            .store
            .save_auth_session(&TokenSet::new(TOKEN.into(), Some("rt".into()), 3600, None))
            .await
            .expect("session should persist");
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "grace@example.com",
                "name": "Grace Hopper"
            })))
            .mount(&app.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/revoke"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&app.server)
            .await;
        app
    }

    pub async fn signed_out() -> Self {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().expect("temp dir should be created");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("feedminder.db").to_string_lossy().into_owned();
        config.google.client_id = "test-client".into();
        config.google.authorization_endpoint = format!("{}/auth", server.uri());
        config.google.token_endpoint = format!("{}/token", server.uri());
        config.google.revoke_endpoint = format!("{}/revoke", server.uri());
        config.google.userinfo_endpoint = format!("{}/userinfo", server.uri());
        config.google.calendar_api_base = format!("{}/calendar/v3", server.uri());
        config.google.gmail_api_base = format!("{}/gmail/v1", server.uri());
        config.delivery.initial_retry_delay_ms = 1;

        let ctx = AppContext::new_with_prompt(config, Arc::new(RefusingPrompt))
            .await
            .expect("context should build");

        Self { ctx, server, _temp_dir: temp_dir }
    }

    /// Send one request line and parse the response line.
    pub async fn send(&self, request: Value) -> Value {
        let line = handle_line(&self.ctx, &request.to_string()).await;
        serde_json::from_str(&line).expect("response should be JSON")
    }

    pub async fn mount_gmail(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": "msg-1" })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_calendar(&self) {
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt-1" })))
            .mount(&self.server)
            .await;
    }
}

pub fn schedule(types: &[&str], title: &str, offset_ms: i64) -> Value {
    let start = Utc::now() + chrono::Duration::milliseconds(offset_ms);
    json!({
        "action": "schedule_reminder",
        "data": {
            "types": types,
            "title": title,
            "description": format!("{title} description"),
            "startTime": start.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        }
    })
}
