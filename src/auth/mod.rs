//! Session identity.
//!
//! Sessions are issued by an external identity provider; this module only
//! reads them. [`IdentityProvider`] is the seam the middleware calls once per
//! request, and [`JwtIdentityProvider`] is the HS256 implementation.

pub mod provider;
pub mod session;

use serde::Serialize;
use thiserror::Error;

use crate::tenant::TenantSlug;

pub use provider::{
    clear_session_cookie_header, session_cookie, session_cookie_header, IdentityProvider,
    JwtIdentityProvider,
};
pub use session::{decode_claims, encode_claims, issue_session_token, Claims};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Session token expired")]
    Expired,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Tenant the caller belongs to; `None` forces re-authentication
    pub tenant: Option<TenantSlug>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, tenant: Option<TenantSlug>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            tenant,
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        let tenant = claims.account_slug.as_deref().and_then(|raw| match TenantSlug::parse(raw) {
            Ok(slug) => Some(slug),
            Err(e) => {
                tracing::warn!("Session for '{}' has unusable account slug: {}", claims.sub, e);
                None
            }
        });

        Self {
            subject: claims.sub,
            email: claims.email,
            tenant,
        }
    }
}
