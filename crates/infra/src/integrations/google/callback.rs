//! Loopback HTTP server that receives the OAuth redirect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use feedminder_domain::{FeedminderError, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};

type OutcomeSender = Arc<StdMutex<Option<oneshot::Sender<CallbackOutcome>>>>;

/// What the provider sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The user approved; `code` is ready for exchange
    Authorized { code: String, state: String },
    /// The provider reported an error, e.g. `access_denied`
    Denied { error: String, description: Option<String> },
}

/// Loopback HTTP server bound to an ephemeral port on 127.0.0.1.
///
/// Accepts exactly one callback; later requests get the failure page.
pub struct OAuthCallbackServer {
    port: u16,
    receiver: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OAuthCallbackServer {
    /// Start the loopback server on an ephemeral port.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|err| {
            FeedminderError::Network(format!("failed to bind OAuth loopback server: {err}"))
        })?;

        let port = listener
            .local_addr()
            .map_err(|err| FeedminderError::Network(format!("failed to determine port: {err}")))?
            .port();

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let sender: OutcomeSender = Arc::new(StdMutex::new(Some(outcome_tx)));

        let app = Router::new().route(
            "/callback",
            get(move |query: Query<HashMap<String, String>>| {
                handle_oauth_callback(query, sender.clone())
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("OAuth callback server error: {}", err);
            }
        });

        debug!(port, "OAuth callback server listening");

        Ok(Self {
            port,
            receiver: Some(outcome_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Redirect URI used in the authorization request.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.port)
    }

    /// Await the callback for at most `timeout`.
    ///
    /// Times out with `AuthDenied`: the user never finished the consent
    /// screen.
    pub async fn wait_for_callback(&mut self, timeout: Duration) -> Result<CallbackOutcome> {
        let receiver = self.receiver.take().ok_or_else(|| {
            FeedminderError::Internal("OAuth callback already consumed".to_string())
        })?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => Err(FeedminderError::Internal("OAuth callback server stopped".into())),
            Err(_) => Err(FeedminderError::AuthDenied(format!(
                "timed out after {}s waiting for authorization",
                timeout.as_secs()
            ))),
        }
    }

    /// Shut down the loopback server gracefully.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(FeedminderError::Internal(format!(
                        "OAuth callback server panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Drop for OAuthCallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_oauth_callback(
    Query(mut params): Query<HashMap<String, String>>,
    sender: OutcomeSender,
) -> Html<&'static str> {
    let outcome = if let Some(error) = params.remove("error") {
        Some(CallbackOutcome::Denied { error, description: params.remove("error_description") })
    } else {
        match (params.remove("code"), params.remove("state")) {
            (Some(code), Some(state)) => Some(CallbackOutcome::Authorized { code, state }),
            _ => None,
        }
    };

    let approved = matches!(outcome, Some(CallbackOutcome::Authorized { .. }));
    let delivered = outcome.is_some_and(|outcome| {
        sender
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .is_some_and(|tx| tx.send(outcome).is_ok())
    });

    if delivered && approved {
        Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Successful</h1><p>You can close this window.</p></body>
</html>"#,
        )
    } else {
        Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>Invalid or unexpected callback parameters.</p></body>
</html>"#,
        )
    }
}
