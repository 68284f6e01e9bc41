//! Google identity provider against a mock token endpoint and a simulated
//! browser that follows the loopback redirect.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use feedminder_common::auth::TokenSet;
use feedminder_core::{IdentityGateway, IdentityProvider, ReminderStore};
use feedminder_domain::{AuthConfig, FeedminderError, GoogleConfig, Result};
use feedminder_infra::{AuthorizationPrompt, GoogleIdentityProvider, GoogleUserInfoClient, HttpClient};
use serde_json::json;
use support::TestDatabase;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Copy)]
enum Browser {
    Approve,
    Deny,
    WrongState,
    Ignore,
}

/// Plays the user's browser: reads the authorization URL and hits the
/// loopback redirect the way the consent screen would.
struct BrowserSimulator {
    behaviour: Browser,
    presented: AtomicUsize,
}

impl BrowserSimulator {
    fn new(behaviour: Browser) -> Arc<Self> {
        Arc::new(Self { behaviour, presented: AtomicUsize::new(0) })
    }

    fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationPrompt for BrowserSimulator {
    async fn present(&self, authorization_url: &str) -> Result<()> {
        self.presented.fetch_add(1, Ordering::SeqCst);

        let url = Url::parse(authorization_url).expect("authorization url");
        let param = |name: &str| {
            url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned()).unwrap_or_default()
        };
        assert_eq!(param("response_type"), "code");
        assert_eq!(param("code_challenge_method"), "S256");
        assert_eq!(param("access_type"), "offline");

        let redirect = param("redirect_uri");
        let state = param("state");
        let callback = match self.behaviour {
            Browser::Approve => format!("{redirect}?code=auth-code-1&state={state}"),
            Browser::Deny => format!("{redirect}?error=access_denied&error_description=user%20said%20no"),
            Browser::WrongState => format!("{redirect}?code=auth-code-1&state=forged"),
            Browser::Ignore => return Ok(()),
        };

        reqwest::get(callback).await.expect("callback request");
        Ok(())
    }
}

fn google(server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        client_id: "test-client".into(),
        authorization_endpoint: format!("{}/auth", server.uri()),
        token_endpoint: format!("{}/token", server.uri()),
        revoke_endpoint: format!("{}/revoke", server.uri()),
        ..GoogleConfig::default()
    }
}

fn provider(server: &MockServer, store: ReminderStore, browser: Arc<BrowserSimulator>) -> GoogleIdentityProvider {
    let http = HttpClient::new().expect("http client");
    GoogleIdentityProvider::new(&google(server), &AuthConfig::default(), &http, store, browser)
        .expect("provider")
        .with_interactive_timeout(Duration::from_secs(5))
}

async fn mount_code_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn expired_session() -> TokenSet {
    TokenSet {
        access_token: "at-old".into(),
        refresh_token: Some("rt-1".into()),
        token_type: "Bearer".into(),
        expires_in: 3600,
        expires_at: Some(Utc::now() - chrono::Duration::hours(1)),
        scope: None,
    }
}

/// Interactive consent, then silent reuse from memory and from the store.
#[tokio::test]
async fn test_interactive_sign_in_then_silent_reuse() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    let db = TestDatabase::new();
    let browser = BrowserSimulator::new(Browser::Approve);
    let identity = provider(&server, db.store(), browser.clone());

    assert_eq!(identity.get_auth_token(true).await.unwrap(), "at-1");
    assert_eq!(identity.get_auth_token(false).await.unwrap(), "at-1");
    assert_eq!(browser.presented(), 1);

    let stored = db.store().auth_session().await.unwrap().expect("session persisted");
    assert_eq!(stored.refresh_token.as_deref(), Some("rt-1"));

    let restarted = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));
    assert_eq!(restarted.get_auth_token(false).await.unwrap(), "at-1");
}

#[tokio::test]
async fn test_silent_without_session_is_unavailable() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let browser = BrowserSimulator::new(Browser::Approve);
    let identity = provider(&server, db.store(), browser.clone());

    assert_eq!(identity.get_auth_token(false).await.unwrap_err(), FeedminderError::AuthUnavailable);
    assert_eq!(browser.presented(), 0);
}

#[tokio::test]
async fn test_expired_session_is_refreshed_silently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    db.store().save_auth_session(&expired_session()).await.unwrap();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));

    assert_eq!(identity.get_auth_token(false).await.unwrap(), "at-2");

    let stored = db.store().auth_session().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "at-2");
    assert_eq!(stored.refresh_token.as_deref(), Some("rt-1"), "previous refresh token kept");
}

#[tokio::test]
async fn test_rejected_refresh_drops_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    db.store().save_auth_session(&expired_session()).await.unwrap();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));

    assert_eq!(identity.get_auth_token(false).await.unwrap_err(), FeedminderError::AuthUnavailable);
    assert_eq!(db.store().auth_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_denied_consent_is_auth_denied() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Deny));

    let err = identity.get_auth_token(true).await.unwrap_err();

    assert_eq!(err, FeedminderError::AuthDenied("access_denied: user said no".into()));
    assert_eq!(db.store().auth_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_forged_state_is_rejected_before_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::WrongState));

    let err = identity.get_auth_token(true).await.unwrap_err();

    assert!(matches!(err, FeedminderError::AuthDenied(ref m) if m.contains("state")), "{err:?}");
}

#[tokio::test]
async fn test_abandoned_consent_times_out() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore))
        .with_interactive_timeout(Duration::from_millis(100));

    let err = identity.get_auth_token(true).await.unwrap_err();

    assert!(matches!(err, FeedminderError::AuthDenied(ref m) if m.contains("timed out")), "{err:?}");
}

#[tokio::test]
async fn test_remove_cached_token_only_forgets_matching_session() {
    let server = MockServer::start().await;
    mount_code_exchange(&server).await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Approve));
    identity.get_auth_token(true).await.unwrap();

    identity.remove_cached_token("someone-else").await.unwrap();
    assert_eq!(identity.get_auth_token(false).await.unwrap(), "at-1");

    identity.remove_cached_token("at-1").await.unwrap();
    assert_eq!(db.store().auth_session().await.unwrap(), None);
    assert_eq!(identity.get_auth_token(false).await.unwrap_err(), FeedminderError::AuthUnavailable);
}

#[tokio::test]
async fn test_revoke_posts_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .and(query_param("token", "at-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));

    identity.revoke_token("at-1").await.unwrap();
}

/// Sign-out must forget a session even when it cannot be refreshed, and
/// revokes the refresh token it held.
#[tokio::test]
async fn test_sign_out_forgets_unrefreshable_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/revoke"))
        .and(query_param("token", "rt-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    db.store().save_auth_session(&expired_session()).await.unwrap();
    let identity = Arc::new(provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore)));
    assert_eq!(identity.get_auth_token(false).await.unwrap_err(), FeedminderError::AuthUnavailable);

    let gateway = IdentityGateway::new(
        identity.clone(),
        Arc::new(GoogleUserInfoClient::new(HttpClient::new().unwrap(), format!("{}/userinfo", server.uri()))),
        db.store(),
    );
    gateway.sign_out().await;

    assert_eq!(db.store().auth_session().await.unwrap(), None);
    let restarted = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));
    assert_eq!(restarted.get_auth_token(false).await.unwrap_err(), FeedminderError::AuthUnavailable);

    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap();
        if requests.iter().any(|r| r.url.path() == "/revoke") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("refresh token was not revoked");
}

#[tokio::test]
async fn test_clear_session_without_session_is_none() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let identity = provider(&server, db.store(), BrowserSimulator::new(Browser::Ignore));

    assert_eq!(identity.clear_session().await.unwrap(), None);
}

/// Silent callers and sign-out are answered while a consent prompt is still
/// waiting for the browser.
#[tokio::test(flavor = "multi_thread")]
async fn test_pending_consent_does_not_block_silent_callers() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    let browser = BrowserSimulator::new(Browser::Ignore);
    let identity = Arc::new(
        provider(&server, db.store(), browser.clone()).with_interactive_timeout(Duration::from_secs(3)),
    );

    let prompting = {
        let identity = identity.clone();
        tokio::spawn(async move { identity.get_auth_token(true).await })
    };
    for _ in 0..100 {
        if browser.presented() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(browser.presented(), 1, "consent prompt shown");

    let silent = tokio::time::timeout(Duration::from_millis(500), identity.get_auth_token(false))
        .await
        .expect("silent call blocked behind the consent prompt");
    assert_eq!(silent.unwrap_err(), FeedminderError::AuthUnavailable);

    let cleared = tokio::time::timeout(Duration::from_millis(500), identity.clear_session())
        .await
        .expect("clear_session blocked behind the consent prompt");
    assert_eq!(cleared.unwrap(), None);

    prompting.abort();
}
