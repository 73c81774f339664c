use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest slug we accept; a slug doubles as a DNS label.
pub const MAX_SLUG_LEN: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("Tenant slug cannot be empty")]
    Empty,

    #[error("Tenant slug is {len} characters long, maximum is {MAX_SLUG_LEN}")]
    TooLong { len: usize },

    #[error("Tenant slug contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("Tenant slug cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// URL-safe identifier of one account (law firm).
///
/// The same value is used as the leftmost host label (`acme.casestream.com`)
/// and as the path segment of the internal tenant route (`/tenant/acme/...`).
/// Always stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn parse(raw: &str) -> Result<Self, SlugError> {
        let slug = raw.trim().to_ascii_lowercase();

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        if slug.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong { len: slug.len() });
        }
        if let Some(bad) = slug
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidCharacter(bad));
        }
        if slug.starts_with('-') || slug.ends_with('-') {
            return Err(SlugError::EdgeHyphen);
        }

        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantSlug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}

impl AsRef<str> for TenantSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
