//! Host header parsing.
//!
//! Maps the inbound `Host` value to a [`HostKind`]. Anything we cannot make
//! sense of degrades to [`HostKind::Unknown`] instead of failing the request.

use std::net::Ipv4Addr;

use serde::Serialize;

use super::slug::TenantSlug;
use crate::config::TenancyConfig;

const LOCALHOST: &str = "localhost";

/// What the host header says about the target tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "tenant", rename_all = "snake_case")]
pub enum HostKind {
    /// Absent, malformed, or an IP literal
    Unknown,
    /// Bare `localhost`
    Local,
    /// Root domain without a tenant label (`casestream.com`, `www.casestream.com`)
    Apex,
    /// `{slug}.casestream.com` or `{slug}.localhost`
    Subdomain(TenantSlug),
}

impl HostKind {
    /// Parses a raw `Host` header value.
    pub fn parse(host: Option<&str>, tenancy: &TenancyConfig) -> Self {
        let Some(name) = host.and_then(strip_port) else {
            return HostKind::Unknown;
        };

        let name = name.trim_end_matches('.');
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return HostKind::Unknown;
        }

        if name.parse::<Ipv4Addr>().is_ok() {
            return HostKind::Unknown;
        }

        let labels: Vec<&str> = name.split('.').collect();
        if labels.iter().any(|label| label.is_empty()) {
            return HostKind::Unknown;
        }

        if name == LOCALHOST {
            return HostKind::Local;
        }

        // *.localhost always carries a tenant label, however many labels there are
        if labels.last() == Some(&LOCALHOST) {
            return tenant_label(labels[0]);
        }

        if name == tenancy.base_domain {
            return HostKind::Apex;
        }

        // Exactly one label in front of the base domain, which may itself be a
        // single label (`acme.intranet`)
        if let Some(label) = name
            .strip_suffix(tenancy.base_domain.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|rest| !rest.contains('.'))
        {
            return tenancy_label(tenancy, label);
        }

        if labels.len() <= 2 {
            return HostKind::Apex;
        }

        tenancy_label(tenancy, labels[0])
    }

    /// The tenant candidate, if the host names one.
    pub fn tenant(&self) -> Option<&TenantSlug> {
        match self {
            HostKind::Subdomain(slug) => Some(slug),
            _ => None,
        }
    }

    pub fn is_apex(&self) -> bool {
        matches!(self, HostKind::Apex)
    }
}

/// Lowercases and removes a numeric `:port` suffix. Bracketed IPv6 literals and
/// non-numeric ports are rejected.
fn strip_port(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();

    if host.starts_with('[') {
        return None;
    }

    match host.split_once(':') {
        Some((name, port)) => {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(name.to_string())
        }
        None => Some(host),
    }
}

/// Leftmost label of a non-local host: an apex alias (`www`) or a tenant.
fn tenancy_label(tenancy: &TenancyConfig, label: &str) -> HostKind {
    if tenancy.apex_aliases.iter().any(|alias| alias == label) {
        return HostKind::Apex;
    }
    tenant_label(label)
}

fn tenant_label(label: &str) -> HostKind {
    match TenantSlug::parse(label) {
        Ok(slug) => HostKind::Subdomain(slug),
        Err(_) => HostKind::Unknown,
    }
}
