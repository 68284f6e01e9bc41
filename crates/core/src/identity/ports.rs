//! Port interfaces for identity and profile lookup

use async_trait::async_trait;
use feedminder_domain::{Result, UserProfile};

/// Supplies bearer tokens for the signed-in account.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return a bearer token.
    ///
    /// With `interactive == false` fails with `AuthUnavailable` when no cached
    /// or refreshable session exists. With `interactive == true` may prompt
    /// the user and fails with `AuthDenied` when they decline.
    async fn get_auth_token(&self, interactive: bool) -> Result<String>;

    /// Forget a cached token locally
    async fn remove_cached_token(&self, token: &str) -> Result<()>;

    /// Revoke a token at the provider
    async fn revoke_token(&self, token: &str) -> Result<()>;

    /// Forget the whole stored session without touching the network.
    ///
    /// Returns the token that should be revoked: the refresh token when one
    /// is held, otherwise the access token. `None` when nothing was stored.
    async fn clear_session(&self) -> Result<Option<String>>;
}

/// Fetches the profile of the account a token belongs to.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Fails with `ProfileFetchFailed` on a non-success status
    async fn fetch_user_info(&self, token: &str) -> Result<UserProfile>;
}
