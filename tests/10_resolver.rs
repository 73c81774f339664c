mod common;

use casestream_gateway::auth::Principal;
use casestream_gateway::config::{AppConfig, TenantUrlMode};
use casestream_gateway::tenant::{
    HostKind, RequestFacts, Resolution, RoutingDecision, TenantResolver, TenantSlug,
};

fn slug(s: &str) -> TenantSlug {
    TenantSlug::parse(s).unwrap()
}

fn member_of(account: &str) -> Principal {
    Principal::new("user-1", Some(slug(account)))
}

fn resolve(resolver: &TenantResolver, host: &str, path: &str, principal: Option<&Principal>) -> Resolution {
    let facts = RequestFacts {
        host: Some(host),
        path,
        query: None,
    };
    resolver.resolve(&facts, principal)
}

fn to_login() -> RoutingDecision {
    RoutingDecision::Redirect {
        location: "/login".to_string(),
    }
}

#[test]
fn subdomains_name_the_tenant() {
    let resolver = TenantResolver::from_config(&AppConfig::for_testing());

    assert_eq!(resolver.host_kind(Some("acme.localhost:3000")), HostKind::Subdomain(slug("acme")));
    assert_eq!(resolver.host_kind(Some("acme.example.com")), HostKind::Subdomain(slug("acme")));
    assert_eq!(resolver.host_kind(Some("localhost:3000")), HostKind::Local);
    assert_eq!(resolver.host_kind(Some("example.com")), HostKind::Apex);
    assert!(resolver.host_kind(Some("localhost")).tenant().is_none());
}

#[test]
fn principal_is_never_routed_to_another_tenant() {
    for mode in [TenantUrlMode::Path, TenantUrlMode::Local, TenantUrlMode::Subdomain] {
        let mut config = common::subdomain_config();
        config.tenancy.url_mode = mode;
        let resolver = TenantResolver::from_config(&config);
        let user = member_of("acme");

        for host in ["globex.example.com", "globex.localhost:3000", "localhost", "example.com"] {
            for path in ["/dashboard", "/cases/12", "/settings/billing"] {
                let res = resolve(&resolver, host, path, Some(&user));
                assert_eq!(res.tenant, Some(slug("acme")), "{} {} {:?}", host, path, mode);
                match res.decision {
                    RoutingDecision::Rewrite { path } => {
                        assert!(path.starts_with("/tenant/acme"), "rewrite to {}", path)
                    }
                    RoutingDecision::Redirect { location } => {
                        assert!(location.contains("acme"), "redirect to {}", location);
                        assert!(!location.contains("globex"), "redirect to {}", location);
                    }
                    RoutingDecision::PassThrough => panic!("{} {} passed through", host, path),
                }
            }
        }
    }
}

#[test]
fn anonymous_requests_to_private_paths_go_to_login() {
    let resolver = TenantResolver::from_config(&common::subdomain_config());

    for host in ["acme.example.com", "acme.localhost", "localhost", "example.com"] {
        for path in ["/dashboard", "/contacts", "/documents/9", "/profile", "/tenant/acme/cases", "/billing"] {
            let res = resolve(&resolver, host, path, None);
            assert_eq!(res.decision, to_login(), "{} {}", host, path);
        }
    }
}

#[test]
fn signed_in_users_skip_public_pages() {
    let resolver = TenantResolver::from_config(&common::subdomain_config());
    let user = member_of("acme");

    for path in ["/", "/login", "/signup", "/forgot-password"] {
        let res = resolve(&resolver, "acme.example.com", path, Some(&user));
        assert_eq!(
            res.decision,
            RoutingDecision::Redirect {
                location: "https://acme.example.com/dashboard".to_string()
            },
            "{}",
            path
        );

        let res = resolve(&resolver, "acme.example.com", path, None);
        assert_eq!(res.decision, RoutingDecision::PassThrough, "{}", path);
    }
}

#[test]
fn rewrites_are_idempotent() {
    let user = member_of("acme");

    for config in [AppConfig::for_testing(), common::subdomain_config()] {
        let resolver = TenantResolver::from_config(&config);

        for host in ["acme.example.com", "localhost:3000", "example.com", "globex.example.com"] {
            for path in ["/dashboard", "/cases/3"] {
                let first = resolve(&resolver, host, path, Some(&user));
                let RoutingDecision::Rewrite { path: rewritten } = first.decision else {
                    continue;
                };

                let second = resolve(&resolver, host, &rewritten, Some(&user));
                assert_eq!(second.decision, RoutingDecision::PassThrough, "{} {}", host, rewritten);
                assert_eq!(second.rule, "tenant_scoped");
            }
        }
    }
}

#[test]
fn missing_tenant_binding_never_guesses() {
    let resolver = TenantResolver::from_config(&common::subdomain_config());
    let user = Principal::new("user-2", None);

    let res = resolve(&resolver, "acme.example.com", "/dashboard", Some(&user));
    assert_eq!(res.decision, to_login());
    assert_eq!(res.tenant, None);
}

#[test]
fn precedence_follows_rule_order() {
    let resolver = TenantResolver::from_config(&common::subdomain_config());
    let user = member_of("acme");

    // bypass beats everything
    assert_eq!(resolve(&resolver, "example.com", "/api/auth/me", None).rule, "bypass");
    assert_eq!(resolve(&resolver, "example.com", "/tenant/acme/logo.png", None).rule, "bypass");
    // tenant scope beats apex
    assert_eq!(resolve(&resolver, "example.com", "/tenant/acme", Some(&user)).rule, "tenant_scoped");
    // apex beats public and protected
    assert_eq!(resolve(&resolver, "example.com", "/login", None).rule, "apex");
    assert_eq!(resolve(&resolver, "www.example.com", "/dashboard", Some(&user)).rule, "apex");
    // public beats protected, protected beats the catch-all
    assert_eq!(resolve(&resolver, "acme.example.com", "/", None).rule, "public");
    assert_eq!(resolve(&resolver, "acme.example.com", "/cases", None).rule, "protected");
    assert_eq!(resolve(&resolver, "acme.example.com", "/casesx", None).rule, "authenticated");
}
