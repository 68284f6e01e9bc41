//! Google OAuth2 userinfo client.

use async_trait::async_trait;
use feedminder_core::ProfileApi;
use feedminder_domain::{FeedminderError, Result, UserProfile};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// `ProfileApi` backed by `GET {userinfo_endpoint}`.
pub struct GoogleUserInfoClient {
    http: HttpClient,
    endpoint: String,
}

impl GoogleUserInfoClient {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl ProfileApi for GoogleUserInfoClient {
    #[instrument(skip_all)]
    async fn fetch_user_info(&self, token: &str) -> Result<UserProfile> {
        let request = self.http.request(Method::GET, &self.endpoint).bearer_auth(token);

        let info: GoogleUserInfo = self.http.send_json(request).await.map_err(|err| match err {
            FeedminderError::Http { status, message } => {
                FeedminderError::ProfileFetchFailed(format!("HTTP {status}: {message}"))
            }
            other => other,
        })?;

        debug!("user profile fetched");
        Ok(info.into())
    }
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUserInfo> for UserProfile {
    fn from(info: GoogleUserInfo) -> Self {
        Self { name: info.name.unwrap_or_default(), email: info.email, picture: info.picture }
    }
}
