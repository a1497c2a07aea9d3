//! Per-call authorization for point queries.

use tracing::{info, warn};

use super::AllowList;
use crate::error::SatelliteError;

/// Metadata key carrying the bearer token.
pub const TOKEN_METADATA_KEY: &str = "token";

/// Authorization-relevant view of a call's metadata.
///
/// A call that carries no metadata at all is represented by `None` at the
/// call site, never by an empty `AuthContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: TokenField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum TokenField {
    #[default]
    Absent,
    Present(String),
    /// A `token` entry exists but is not valid ASCII
    Unreadable,
}

impl AuthContext {
    /// Metadata without a token entry.
    #[must_use]
    pub const fn without_token() -> Self {
        Self {
            token: TokenField::Absent,
        }
    }

    /// Metadata carrying `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: TokenField::Present(token.into()),
        }
    }

    /// Metadata with a `token` entry that could not be decoded.
    #[must_use]
    pub const fn with_unreadable_token() -> Self {
        Self {
            token: TokenField::Unreadable,
        }
    }

    /// The token, if one was readable.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match &self.token {
            TokenField::Present(token) => Some(token),
            TokenField::Absent | TokenField::Unreadable => None,
        }
    }
}

/// Outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The call carried no metadata; authorization was skipped
    Unauthenticated,
    /// The call presented an allow-listed token
    Token(String),
}

/// Checks call contexts against the allow-list.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    allow_list: AllowList,
}

impl AuthorizationGate {
    /// Creates a gate over a fixed allow-list.
    #[must_use]
    pub const fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    /// Applies the point-query policy:
    ///
    /// 1. no metadata: authorized, nothing to check
    /// 2. metadata without a token: `AuthFailure`
    /// 3. token not allow-listed: `PermissionDenied`
    /// 4. allow-listed token: authorized
    pub fn authorize(&self, ctx: Option<&AuthContext>) -> Result<Authorization, SatelliteError> {
        let Some(ctx) = ctx else {
            return Ok(Authorization::Unauthenticated);
        };

        let Some(token) = ctx.token() else {
            warn!("Request blocked, no valid token provided");
            return Err(SatelliteError::AuthFailure);
        };

        if !self.allow_list.contains(token) {
            warn!(token = %token, "Unauthorized token");
            return Err(SatelliteError::PermissionDenied {
                token: token.to_string(),
            });
        }

        info!(token = %token, "Client-provided token accepted");
        Ok(Authorization::Token(token.to_string()))
    }
}
