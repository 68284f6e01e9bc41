//! Identity gateway: tokens, profile lookup, sign-in and sign-out

use std::sync::Arc;

use feedminder_domain::{Result, UserProfile};
use tracing::{debug, info, instrument, warn};

use super::ports::{IdentityProvider, ProfileApi};
use crate::storage::ReminderStore;

/// Account-level operations over the identity provider and profile API.
#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileApi>,
    store: ReminderStore,
}

impl IdentityGateway {
    /// Create a gateway persisting profiles through `store`.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileApi>,
        store: ReminderStore,
    ) -> Self {
        Self { provider, profiles, store }
    }

    /// Bearer token from the provider; see [`IdentityProvider::get_auth_token`].
    pub async fn get_auth_token(&self, interactive: bool) -> Result<String> {
        self.provider.get_auth_token(interactive).await
    }

    /// Profile of the account `token` belongs to.
    pub async fn fetch_user_info(&self, token: &str) -> Result<UserProfile> {
        self.profiles.fetch_user_info(token).await
    }

    /// Force interactive authorization, then fetch and persist the profile.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<UserProfile> {
        let token = self.get_auth_token(true).await?;
        let profile = self.fetch_user_info(&token).await?;
        self.store.save_user_profile(&profile).await?;
        info!("signed in");
        Ok(profile)
    }

    /// Best-effort current profile. Falls back to the last persisted profile
    /// when silent authorization or the fetch fails. Never errors.
    #[instrument(skip(self))]
    pub async fn get_user(&self) -> Option<UserProfile> {
        match self.refresh_profile().await {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(error = %e, "live profile unavailable, using cached copy");
                match self.store.user_profile().await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(error = %e, "failed to read cached profile");
                        None
                    }
                }
            }
        }
    }

    /// Forget the stored session, revoke it in the background and clear the
    /// stored profile. Always completes, even when the session could not be
    /// refreshed.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        match self.provider.clear_session().await {
            Ok(Some(token)) => {
                let provider = Arc::clone(&self.provider);
                tokio::spawn(async move {
                    if let Err(e) = provider.revoke_token(&token).await {
                        debug!(error = %e, "token revocation failed");
                    }
                });
            }
            Ok(None) => debug!("no session to revoke"),
            Err(e) => warn!(error = %e, "failed to clear stored session"),
        }

        if let Err(e) = self.store.clear_user_profile().await {
            warn!(error = %e, "failed to clear stored profile");
        }
        info!("signed out");
    }

    async fn refresh_profile(&self) -> Result<UserProfile> {
        let token = self.get_auth_token(false).await?;
        let profile = self.fetch_user_info(&token).await?;
        if let Err(e) = self.store.save_user_profile(&profile).await {
            warn!(error = %e, "failed to cache profile");
        }
        Ok(profile)
    }
}
