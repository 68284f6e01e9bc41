//! OAuth 2.0 client for the authorization-code + PKCE grant
//!
//! Builds authorization URLs and talks to the token and revocation endpoints.
//! Stateless: the caller owns the [`PKCEChallenge`] between the authorization
//! redirect and the code exchange.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::pkce::{validate_state, PKCEChallenge};
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

/// Error type for OAuth client operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// HTTP request failed before a response was read
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// OAuth server returned an error body
    #[error("OAuth error: {0}")]
    OAuthError(OAuthError),

    /// Non-success response without a parseable OAuth error body
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// State parameter mismatch
    #[error("state mismatch on authorization callback")]
    StateMismatch,

    /// Failed to parse a success response
    #[error("parse error: {0}")]
    ParseError(String),

    /// No refresh token available
    #[error("no refresh token available")]
    NoRefreshToken,
}

impl OAuthClientError {
    /// True when the provider rejected the grant itself (revoked or expired
    /// refresh token, denied consent) rather than the request failing in
    /// transit.
    #[must_use]
    pub fn is_grant_rejected(&self) -> bool {
        matches!(self, Self::OAuthError(e) if e.error == "invalid_grant" || e.error == "access_denied")
    }
}

/// OAuth 2.0 client with PKCE support.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: Client,
}

impl OAuthClient {
    /// Create a client with its own HTTP connection pool.
    #[must_use]
    pub fn new(config: OAuthConfig, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { config, http }
    }

    /// Create a client sharing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the browser authorization URL for `redirect_uri` and the
    /// challenge that must be presented again at [`Self::exchange_code`].
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str) -> (String, PKCEChallenge) {
        let challenge = PKCEChallenge::generate();

        let mut params: Vec<(&str, String)> = vec![
            ("response_type", "code".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("redirect_uri", redirect_uri.to_string()),
            ("scope", self.config.scope_string()),
            ("state", challenge.state.clone()),
            ("code_challenge", challenge.code_challenge.clone()),
            ("code_challenge_method", challenge.challenge_method().to_string()),
        ];
        params.extend(self.config.extra_authorize_params.iter().map(|(k, v)| (k.as_str(), v.clone())));

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        (format!("{}?{}", self.config.authorization_endpoint, query_string), challenge)
    }

    /// Exchange an authorization code after validating the echoed state.
    pub async fn exchange_code(
        &self,
        code: &str,
        returned_state: &str,
        challenge: &PKCEChallenge,
        redirect_uri: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if !validate_state(&challenge.state, returned_state) {
            return Err(OAuthClientError::StateMismatch);
        }

        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
            ("code_verifier", challenge.code_verifier.clone()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        self.token_request(&form).await
    }

    /// Obtain a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let tokens = self.token_request(&form).await?;
        Ok(tokens.with_fallback_refresh_token(Some(refresh_token)))
    }

    /// Revoke a token at the provider.
    pub async fn revoke(&self, token: &str) -> Result<(), OAuthClientError> {
        let response = self
            .http
            .post(&self.config.revoke_endpoint)
            .query(&[("token", token)])
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;

        if response.status().is_success() {
            debug!("token revoked");
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn token_request(&self, form: &[(&str, String)]) -> Result<TokenSet, OAuthClientError> {
        let response = self.http.post(&self.config.token_endpoint).form(form).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
        Ok(token_response.into())
    }

    async fn error_from_response(response: reqwest::Response) -> OAuthClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<OAuthError>(&body) {
            Ok(error) => OAuthClientError::OAuthError(error),
            Err(_) => OAuthClientError::UnexpectedStatus { status, body },
        }
    }
}
