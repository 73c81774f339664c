//! Path classification.
//!
//! A [`RouteTable`] holds ordered `(matcher, class)` rules built from
//! configuration. The first matching rule wins; a path nothing matches is
//! [`PathClass::Other`]. Order:
//!
//! 1. bypass (API, health, static assets)
//! 2. tenant-scoped (`/tenant/{slug}/...`)
//! 3. public (exact match)
//! 4. protected (segment-aware prefix)

use serde::Serialize;

use super::slug::TenantSlug;
use crate::config::{RoutesConfig, TenancyConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum PathClass {
    Bypass,
    /// Already inside the internal tenant space. `tenant` is `None` when the
    /// segment after the prefix is missing or not a valid slug.
    TenantScoped { tenant: Option<TenantSlug> },
    Public,
    Protected,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Bypass,
    TenantScoped,
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathMatcher {
    Exact(String),
    /// `/cases` matches `/cases` and `/cases/12`, not `/casestudy`
    Segment(String),
    /// Raw prefix, for entries like `/api/` that carry their own slash
    Prefix(String),
    Extension(String),
}

impl PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(p) => path == p,
            PathMatcher::Segment(p) => match path.strip_prefix(p.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
            PathMatcher::Prefix(p) => path.starts_with(p.as_str()),
            PathMatcher::Extension(ext) => path
                .rsplit('/')
                .next()
                .and_then(|file| file.rsplit_once('.'))
                .map(|(_, e)| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone)]
struct RouteRule {
    matcher: PathMatcher,
    kind: RouteKind,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    tenant_prefix: String,
}

impl RouteTable {
    pub fn new(routes: &RoutesConfig, tenancy: &TenancyConfig) -> Self {
        let tenant_prefix = tenancy.tenant_prefix.trim_end_matches('/').to_string();
        let mut rules = Vec::new();

        for prefix in &routes.bypass_prefixes {
            let matcher = if prefix.ends_with('/') {
                PathMatcher::Prefix(prefix.clone())
            } else {
                PathMatcher::Segment(prefix.clone())
            };
            rules.push(RouteRule { matcher, kind: RouteKind::Bypass });
        }
        for ext in &routes.bypass_extensions {
            rules.push(RouteRule {
                matcher: PathMatcher::Extension(ext.trim_start_matches('.').to_string()),
                kind: RouteKind::Bypass,
            });
        }

        rules.push(RouteRule {
            matcher: PathMatcher::Segment(tenant_prefix.clone()),
            kind: RouteKind::TenantScoped,
        });

        for path in &routes.public {
            rules.push(RouteRule {
                matcher: PathMatcher::Exact(path.clone()),
                kind: RouteKind::Public,
            });
        }
        for prefix in &routes.protected {
            rules.push(RouteRule {
                matcher: PathMatcher::Segment(prefix.trim_end_matches('/').to_string()),
                kind: RouteKind::Protected,
            });
        }

        Self { rules, tenant_prefix }
    }

    pub fn classify(&self, path: &str) -> PathClass {
        let kind = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.kind);

        match kind {
            Some(RouteKind::Bypass) => PathClass::Bypass,
            Some(RouteKind::TenantScoped) => PathClass::TenantScoped {
                tenant: self.embedded_tenant(path),
            },
            Some(RouteKind::Public) => PathClass::Public,
            Some(RouteKind::Protected) => PathClass::Protected,
            None => PathClass::Other,
        }
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        matches!(self.classify(path), PathClass::Bypass)
    }

    /// Slug in `/tenant/{slug}/...`.
    fn embedded_tenant(&self, path: &str) -> Option<TenantSlug> {
        let rest = path.strip_prefix(self.tenant_prefix.as_str())?;
        let segment = rest.strip_prefix('/')?.split('/').next()?;
        TenantSlug::parse(segment).ok()
    }
}
