//! Account lookups by slug.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use super::slug::{SlugError, TenantSlug};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Account directory unavailable: {0}")]
    Unavailable(String),
}

/// Persistence seam for accounts. Only slug lookups are needed here; account
/// and staff records are owned by the application database.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn slug_exists(&self, slug: &TenantSlug) -> Result<bool, DirectoryError>;
}

/// Directory kept in process memory, for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: RwLock<HashSet<TenantSlug>>,
}

impl InMemoryAccountDirectory {
    /// Seeds the directory; entries that are not valid slugs are skipped.
    pub fn with_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for raw in accounts {
            match TenantSlug::parse(raw.as_ref()) {
                Ok(slug) => {
                    set.insert(slug);
                }
                Err(e) => tracing::warn!("Skipping account '{}': {}", raw.as_ref(), e),
            }
        }

        tracing::debug!("Account directory seeded with {} accounts", set.len());
        Self {
            accounts: RwLock::new(set),
        }
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn slug_exists(&self, slug: &TenantSlug) -> Result<bool, DirectoryError> {
        Ok(self.accounts.read().await.contains(slug))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugAvailability {
    pub slug: TenantSlug,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error(transparent)]
    InvalidSlug(#[from] SlugError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Whether `raw` can be claimed by a new account.
///
/// A malformed slug is an error; a well-formed one that is reserved or taken
/// comes back with `available: false`.
pub async fn check_slug_availability(
    directory: &dyn AccountDirectory,
    reserved: &[String],
    raw: &str,
) -> Result<SlugAvailability, AvailabilityError> {
    let slug = TenantSlug::parse(raw)?;

    if reserved.iter().any(|r| r.eq_ignore_ascii_case(slug.as_str())) {
        return Ok(SlugAvailability {
            slug,
            available: false,
            reason: Some("reserved"),
        });
    }

    let taken = directory.slug_exists(&slug).await?;
    Ok(SlugAvailability {
        slug,
        available: !taken,
        reason: taken.then_some("taken"),
    })
}
