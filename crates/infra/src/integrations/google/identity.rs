//! Google identity provider: cached session, refresh-token grant and the
//! interactive authorization-code + PKCE flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feedminder_common::auth::{OAuthClient, OAuthClientError, OAuthConfig, TokenSet};
use feedminder_core::{IdentityProvider, ReminderStore};
use feedminder_domain::{AuthConfig, FeedminderError, GoogleConfig, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::callback::{CallbackOutcome, OAuthCallbackServer};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Shows the authorization URL to the user.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Present `authorization_url`; the browser redirect completes the flow.
    async fn present(&self, authorization_url: &str) -> Result<()>;
}

/// Prompt that writes the URL to the log at `warn` level.
pub struct LoggingPrompt;

#[async_trait]
impl AuthorizationPrompt for LoggingPrompt {
    async fn present(&self, authorization_url: &str) -> Result<()> {
        warn!(url = authorization_url, "open this URL in a browser to authorize Feedminder");
        Ok(())
    }
}

/// Build the OAuth client configuration for Google.
///
/// Requests offline access so a refresh token is issued, and forces the
/// consent screen so it is re-issued after a revoke.
pub fn google_oauth_config(google: &GoogleConfig) -> Result<OAuthConfig> {
    for endpoint in [&google.authorization_endpoint, &google.token_endpoint, &google.revoke_endpoint] {
        Url::parse(endpoint).map_err(|err| {
            FeedminderError::Config(format!("invalid OAuth endpoint URL {endpoint}: {err}"))
        })?;
    }

    Ok(OAuthConfig {
        client_id: google.client_id.clone(),
        client_secret: google.client_secret.clone(),
        authorization_endpoint: google.authorization_endpoint.clone(),
        token_endpoint: google.token_endpoint.clone(),
        revoke_endpoint: google.revoke_endpoint.clone(),
        scopes: google.scopes.clone(),
        extra_authorize_params: vec![
            ("access_type".to_string(), "offline".to_string()),
            ("prompt".to_string(), "consent".to_string()),
        ],
    })
}

/// `IdentityProvider` for a single Google account.
///
/// The token set lives in memory and under the `auth_session` store key so
/// silent acquisition survives restarts. The session lock is never held
/// across the interactive consent flow, so silent callers are not blocked by
/// a pending prompt.
pub struct GoogleIdentityProvider {
    oauth: OAuthClient,
    store: ReminderStore,
    prompt: Arc<dyn AuthorizationPrompt>,
    session: Mutex<Session>,
    interactive_flow: Mutex<()>,
    interactive_timeout: Duration,
    refresh_threshold_seconds: i64,
}

#[derive(Default)]
struct Session {
    loaded: bool,
    tokens: Option<TokenSet>,
}

impl GoogleIdentityProvider {
    /// Create a provider sharing `http`'s connection pool for token requests.
    pub fn new(
        google: &GoogleConfig,
        auth: &AuthConfig,
        http: &HttpClient,
        store: ReminderStore,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Result<Self> {
        let oauth = OAuthClient::with_http_client(google_oauth_config(google)?, http.inner().clone());
        Ok(Self {
            oauth,
            store,
            prompt,
            session: Mutex::new(Session::default()),
            interactive_flow: Mutex::new(()),
            interactive_timeout: Duration::from_secs(auth.interactive_timeout_secs),
            refresh_threshold_seconds: auth.refresh_threshold_seconds,
        })
    }

    /// Override how long the interactive flow waits for the redirect.
    #[must_use]
    pub fn with_interactive_timeout(mut self, timeout: Duration) -> Self {
        self.interactive_timeout = timeout;
        self
    }

    async fn load_session(&self, session: &mut Session) {
        if session.loaded {
            return;
        }
        session.loaded = true;
        match self.store.auth_session().await {
            Ok(tokens) => session.tokens = tokens,
            Err(e) => warn!(error = %e, "failed to read stored session"),
        }
    }

    async fn persist(&self, session: &mut Session, tokens: TokenSet) -> String {
        if let Err(e) = self.store.save_auth_session(&tokens).await {
            warn!(error = %e, "failed to persist session");
        }
        let access_token = tokens.access_token.clone();
        session.tokens = Some(tokens);
        access_token
    }

    async fn forget(&self, session: &mut Session) {
        session.tokens = None;
        if let Err(e) = self.store.clear_auth_session().await {
            warn!(error = %e, "failed to clear stored session");
        }
    }

    /// Unexpired cached access token, without any network call.
    async fn cached_token(&self) -> Option<String> {
        let mut session = self.session.lock().await;
        self.load_session(&mut session).await;
        session
            .tokens
            .as_ref()
            .filter(|t| !t.is_expired(self.refresh_threshold_seconds))
            .map(|t| t.access_token.clone())
    }

    /// Cached token, refreshed through the refresh-token grant when expired.
    async fn silent_token(&self) -> Option<String> {
        let mut session = self.session.lock().await;
        self.load_session(&mut session).await;

        let tokens = session.tokens.as_ref()?;
        if !tokens.is_expired(self.refresh_threshold_seconds) {
            return Some(tokens.access_token.clone());
        }
        let refresh_token = tokens.refresh_token.clone()?;

        match self.oauth.refresh(&refresh_token).await {
            Ok(refreshed) => {
                debug!("access token refreshed");
                Some(self.persist(&mut session, refreshed).await)
            }
            Err(e) if e.is_grant_rejected() => {
                info!("refresh token rejected, session dropped");
                self.forget(&mut session).await;
                None
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                None
            }
        }
    }

    async fn authorize(&self) -> Result<TokenSet> {
        let mut server = OAuthCallbackServer::start().await?;
        let redirect_uri = server.redirect_uri();
        let (authorization_url, challenge) = self.oauth.authorization_url(&redirect_uri);

        self.prompt.present(&authorization_url).await?;
        let outcome = server.wait_for_callback(self.interactive_timeout).await;
        if let Err(e) = server.shutdown().await {
            warn!(error = %e, "OAuth callback server did not shut down cleanly");
        }

        match outcome? {
            CallbackOutcome::Authorized { code, state } => self
                .oauth
                .exchange_code(&code, &state, &challenge, &redirect_uri)
                .await
                .map_err(map_oauth_error),
            CallbackOutcome::Denied { error, description } => Err(FeedminderError::AuthDenied(
                description.map_or_else(|| error.clone(), |desc| format!("{error}: {desc}")),
            )),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    #[instrument(skip(self))]
    async fn get_auth_token(&self, interactive: bool) -> Result<String> {
        if let Some(token) = self.silent_token().await {
            return Ok(token);
        }
        if !interactive {
            return Err(FeedminderError::AuthUnavailable);
        }

        // One consent flow at a time; the session lock stays free meanwhile.
        let _flow = self.interactive_flow.lock().await;
        if let Some(token) = self.cached_token().await {
            debug!("session established by a concurrent authorization");
            return Ok(token);
        }

        let tokens = self.authorize().await?;
        info!("interactive authorization completed");
        let mut session = self.session.lock().await;
        Ok(self.persist(&mut session, tokens).await)
    }

    async fn remove_cached_token(&self, token: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        self.load_session(&mut session).await;

        let matches = session.tokens.as_ref().is_some_and(|t| t.access_token == token);
        if matches {
            self.forget(&mut session).await;
        } else {
            debug!("token to remove is not the cached one");
        }
        Ok(())
    }

    async fn revoke_token(&self, token: &str) -> Result<()> {
        self.oauth.revoke(token).await.map_err(map_oauth_error)
    }

    async fn clear_session(&self) -> Result<Option<String>> {
        let mut session = self.session.lock().await;
        self.load_session(&mut session).await;

        let revocable = session
            .tokens
            .as_ref()
            .map(|t| t.refresh_token.clone().unwrap_or_else(|| t.access_token.clone()));
        session.tokens = None;
        self.store.clear_auth_session().await?;
        Ok(revocable)
    }
}

fn map_oauth_error(err: OAuthClientError) -> FeedminderError {
    match err {
        OAuthClientError::RequestFailed(e) => InfraError::from(e).into(),
        OAuthClientError::OAuthError(e) => FeedminderError::AuthDenied(e.to_string()),
        OAuthClientError::UnexpectedStatus { status, body } => {
            FeedminderError::Http { status, message: body }
        }
        OAuthClientError::StateMismatch => {
            FeedminderError::AuthDenied("state mismatch on authorization callback".into())
        }
        OAuthClientError::ParseError(msg) => FeedminderError::Internal(msg),
        OAuthClientError::NoRefreshToken => FeedminderError::AuthUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use feedminder_common::auth::OAuthError;

    use super::*;

    #[test]
    fn oauth_config_requests_offline_access() {
        let mut google = GoogleConfig::default();
        google.client_id = "client".into();

        let config = google_oauth_config(&google).unwrap();
        assert_eq!(config.client_id, "client");
        assert!(config.extra_authorize_params.contains(&("access_type".into(), "offline".into())));
        assert_eq!(config.scopes.len(), 4);
    }

    #[test]
    fn oauth_config_rejects_invalid_endpoint() {
        let google = GoogleConfig { token_endpoint: "not a url".into(), ..GoogleConfig::default() };
        assert!(matches!(google_oauth_config(&google), Err(FeedminderError::Config(_))));
    }

    #[test]
    fn provider_errors_map_to_auth_denied() {
        let err = map_oauth_error(OAuthClientError::OAuthError(OAuthError {
            error: "access_denied".into(),
            error_description: None,
        }));
        assert_eq!(err, FeedminderError::AuthDenied("access_denied".into()));
        assert!(matches!(
            map_oauth_error(OAuthClientError::StateMismatch),
            FeedminderError::AuthDenied(_)
        ));
    }
}
