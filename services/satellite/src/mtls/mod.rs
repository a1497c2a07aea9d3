//! Mutual TLS credentials and peer identity.

pub mod credentials;
pub mod identity;

pub use credentials::{ClientCredentials, CredentialsError, ServerCredentials};
pub use identity::PeerIdentity;
