//! Identity: token acquisition and the signed-in user's profile

pub mod ports;
pub mod service;

pub use ports::{IdentityProvider, ProfileApi};
pub use service::IdentityGateway;
