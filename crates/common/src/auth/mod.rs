//! OAuth 2.0 + PKCE building blocks
//!
//! Provider-neutral pieces used by the Google identity adapter:
//!
//! - **[`types`]**: `TokenSet`, `OAuthConfig`, `OAuthError`
//! - **[`pkce`]**: RFC 7636 verifier/challenge/state generation
//! - **[`client`]**: authorization URL, code exchange, refresh and revocation
//!
//! The loopback redirect listener lives in the infra crate because it binds a
//! socket and serves HTTP.

pub mod client;
pub mod pkce;
pub mod types;

pub use client::{OAuthClient, OAuthClientError};
pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state, PKCEChallenge,
};
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
