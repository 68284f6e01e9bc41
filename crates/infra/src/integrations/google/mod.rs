//! Google adapters: identity (OAuth 2.0 + PKCE), userinfo, Calendar and
//! Gmail.

pub mod calendar;
pub mod callback;
pub mod gmail;
pub mod identity;
pub mod userinfo;

pub use calendar::GoogleCalendarClient;
pub use callback::{CallbackOutcome, OAuthCallbackServer};
pub use gmail::GmailClient;
pub use identity::{google_oauth_config, AuthorizationPrompt, GoogleIdentityProvider, LoggingPrompt};
pub use userinfo::GoogleUserInfoClient;
