use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::session::decode_claims;
use super::{AuthError, Principal};
use crate::config::SecurityConfig;

/// Reads the caller's identity from a request.
///
/// `Ok(None)` means no credentials were presented. An `Err` means credentials
/// were presented and rejected.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError>;
}

/// Validates HS256 session tokens from the session cookie, or from an
/// `Authorization: Bearer` header when no cookie is present.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    secret: String,
    cookie_name: String,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.session_cookie.clone())
    }

    fn token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        session_cookie(headers, &self.cookie_name).or_else(|| bearer_token(headers))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError> {
        let Some(token) = self.token(headers) else {
            return Ok(None);
        };

        let claims = decode_claims(token, &self.secret)?;
        Ok(Some(Principal::from(claims)))
    }
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// `Set-Cookie` value that stores a session token.
pub fn session_cookie_header(name: &str, token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie_header(name: &str, secure: bool) -> String {
    session_cookie_header(name, "", 0, secure)
}
