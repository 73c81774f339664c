use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::SecurityConfig;
use crate::tenant::TenantSlug;

/// Session token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Tenant the user belongs to. Kept as a raw string so a bad value in a
    /// token degrades to "no tenant" instead of failing to decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_slug: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for `subject` expiring `expiry_hours` from now. Fails when the
    /// expiry does not fit in a timestamp.
    pub fn new(subject: impl Into<String>, expiry_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::TokenGeneration(format!("JWT expiry of {} hours is out of range", expiry_hours))
            })?;

        Ok(Self {
            sub: subject.into(),
            email: None,
            account_slug: None,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tenant(mut self, slug: &TenantSlug) -> Self {
        self.account_slug = Some(slug.to_string());
        self
    }
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

/// Mints a session token with the configured secret and lifetime.
pub fn issue_session_token(
    security: &SecurityConfig,
    subject: &str,
    email: Option<&str>,
    tenant: Option<&TenantSlug>,
) -> Result<String, AuthError> {
    let mut claims = Claims::new(subject, security.jwt_expiry_hours)?;
    if let Some(email) = email {
        claims = claims.with_email(email);
    }
    if let Some(slug) = tenant {
        claims = claims.with_tenant(slug);
    }
    encode_claims(&claims, &security.jwt_secret)
}
