//! Canonical tenant URLs.

use thiserror::Error;
use url::Url;

use super::slug::TenantSlug;
use crate::config::{TenancyConfig, TenantUrlMode};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot build tenant URL for '{slug}': {reason}")]
pub struct TenantUrlError {
    pub slug: String,
    pub reason: String,
}

/// Where a tenant lives: on this host under the tenant prefix, or elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantTarget {
    /// Path on the current host, served through an internal rewrite
    Internal(String),
    /// Absolute URL, reached through a redirect
    External(Url),
}

#[derive(Debug, Clone)]
pub struct TenantUrlBuilder {
    mode: TenantUrlMode,
    scheme: String,
    base_domain: String,
    dev_port: u16,
    tenant_prefix: String,
}

impl TenantUrlBuilder {
    pub fn new(tenancy: &TenancyConfig) -> Self {
        Self {
            mode: tenancy.url_mode,
            scheme: tenancy.url_scheme.clone(),
            base_domain: tenancy.base_domain.trim_matches('.').to_string(),
            dev_port: tenancy.dev_port,
            tenant_prefix: tenancy.tenant_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// `/tenant/{slug}{path}`; the only internal encoding of tenant scope.
    pub fn canonical_internal_path(&self, slug: &TenantSlug, path: &str) -> String {
        let path = normalize_path(path);
        if path == "/" {
            format!("{}/{}", self.tenant_prefix, slug)
        } else {
            format!("{}/{}{}", self.tenant_prefix, slug, path)
        }
    }

    /// Canonical URL of `path` inside the tenant, in the configured form.
    pub fn build(&self, slug: &TenantSlug, path: &str) -> Result<TenantTarget, TenantUrlError> {
        let origin = match self.mode {
            TenantUrlMode::Path => {
                return Ok(TenantTarget::Internal(self.canonical_internal_path(slug, path)));
            }
            TenantUrlMode::Local => format!("http://{}.localhost:{}/", slug, self.dev_port),
            TenantUrlMode::Subdomain => format!("{}://{}.{}/", self.scheme, slug, self.base_domain),
        };

        let mut url = Url::parse(&origin).map_err(|e| TenantUrlError {
            slug: slug.to_string(),
            reason: e.to_string(),
        })?;
        url.set_path(&normalize_path(path));

        Ok(TenantTarget::External(url))
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn acme() -> TenantSlug {
        TenantSlug::parse("acme").unwrap()
    }

    fn builder(mode: TenantUrlMode) -> TenantUrlBuilder {
        let mut config = AppConfig::production();
        config.tenancy.url_mode = mode;
        TenantUrlBuilder::new(&config.tenancy)
    }

    #[test]
    fn test_path_mode() {
        let target = builder(TenantUrlMode::Path).build(&acme(), "/dashboard").unwrap();
        assert_eq!(target, TenantTarget::Internal("/tenant/acme/dashboard".to_string()));
    }

    #[test]
    fn test_local_mode() {
        let target = builder(TenantUrlMode::Local).build(&acme(), "/cases/7").unwrap();
        match target {
            TenantTarget::External(url) => {
                assert_eq!(url.as_str(), "http://acme.localhost:3000/cases/7")
            }
            other => panic!("expected external target, got {:?}", other),
        }
    }

    #[test]
    fn test_subdomain_mode() {
        let target = builder(TenantUrlMode::Subdomain).build(&acme(), "dashboard").unwrap();
        match target {
            TenantTarget::External(url) => {
                assert_eq!(url.as_str(), "https://acme.casestream.com/dashboard")
            }
            other => panic!("expected external target, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base_domain() {
        let mut config = AppConfig::production();
        config.tenancy.base_domain = "bad domain".to_string();
        let builder = TenantUrlBuilder::new(&config.tenancy);

        let err = builder.build(&acme(), "/dashboard").unwrap_err();
        assert_eq!(err.slug, "acme");
    }

    #[test]
    fn test_canonical_internal_path() {
        let builder = builder(TenantUrlMode::Subdomain);
        assert_eq!(builder.canonical_internal_path(&acme(), "/"), "/tenant/acme");
        assert_eq!(builder.canonical_internal_path(&acme(), "/cases"), "/tenant/acme/cases");
    }
}
