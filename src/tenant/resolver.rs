//! Tenant routing decisions.
//!
//! [`TenantResolver::resolve`] is a pure function of the host header, the path
//! and the caller's principal. It returns a [`Resolution`]: the decision plus
//! the rule and reason that produced it, which the middleware uses for logging.
//!
//! # Rule order
//!
//! Rules are `(predicate, outcome)` pairs checked in this order; the first
//! predicate that holds decides.
//!
//! | # | rule            | applies when                       |
//! |---|-----------------|------------------------------------|
//! | 1 | `bypass`        | API, health or static asset path   |
//! | 2 | `tenant_scoped` | path under the tenant prefix       |
//! | 3 | `apex`          | host is the bare root domain       |
//! | 4 | `public`        | login, signup, home, reset         |
//! | 5 | `protected`     | dashboard and business paths       |
//! | 6 | `authenticated` | anything else                      |
//!
//! `tenant_scoped` comes before `apex` so that feeding a rewritten path back
//! into the resolver is a pass-through whatever the host.

use serde::Serialize;

use super::host::HostKind;
use super::routes::{PathClass, RouteTable};
use super::slug::TenantSlug;
use super::url::{TenantTarget, TenantUrlBuilder};
use crate::auth::Principal;
use crate::config::{AppConfig, RoutesConfig, TenancyConfig};

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutingDecision {
    PassThrough,
    Rewrite { path: String },
    Redirect { location: String },
}

/// Why a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Bypassed,
    TenantScopeGranted,
    TenantAccessDenied,
    ApexToTenant,
    ApexPublic,
    PublicAnonymous,
    PublicToDashboard,
    TenantRewrite,
    TenantMismatch,
    TenantFromSession,
    Authenticated,
    NotAuthenticated,
    MissingTenantBinding,
    TenantUrlUnavailable,
}

impl DecisionReason {
    /// Reasons that mean somebody tried to reach a tenant that is not theirs.
    pub fn is_cross_tenant(&self) -> bool {
        matches!(self, DecisionReason::TenantMismatch | DecisionReason::TenantAccessDenied)
    }

    /// Reasons caused by bad data or configuration rather than the caller.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            DecisionReason::MissingTenantBinding | DecisionReason::TenantUrlUnavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub decision: RoutingDecision,
    pub rule: &'static str,
    pub reason: DecisionReason,
    /// Tenant the request ends up scoped to, if any
    pub tenant: Option<TenantSlug>,
}

/// Request facts the resolver looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    pub host: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Per-request view shared by rule predicates and outcomes.
struct Context<'a> {
    host: HostKind,
    class: PathClass,
    path: &'a str,
    query: Option<&'a str>,
    principal: Option<&'a Principal>,
}

impl Context<'_> {
    fn bound_tenant(&self) -> Option<&TenantSlug> {
        self.principal.and_then(|p| p.tenant.as_ref())
    }
}

type Outcome = (RoutingDecision, DecisionReason, Option<TenantSlug>);

struct Rule {
    name: &'static str,
    applies: fn(&Context<'_>) -> bool,
    outcome: fn(&TenantResolver, &Context<'_>) -> Outcome,
}

static RULES: [Rule; 6] = [
    Rule {
        name: "bypass",
        applies: |ctx| matches!(ctx.class, PathClass::Bypass),
        outcome: |_, _| (RoutingDecision::PassThrough, DecisionReason::Bypassed, None),
    },
    Rule {
        name: "tenant_scoped",
        applies: |ctx| matches!(ctx.class, PathClass::TenantScoped { .. }),
        outcome: TenantResolver::tenant_scoped,
    },
    Rule {
        name: "apex",
        applies: |ctx| ctx.host.is_apex(),
        outcome: TenantResolver::apex,
    },
    Rule {
        name: "public",
        applies: |ctx| matches!(ctx.class, PathClass::Public),
        outcome: TenantResolver::public,
    },
    Rule {
        name: "protected",
        applies: |ctx| matches!(ctx.class, PathClass::Protected),
        outcome: TenantResolver::protected,
    },
    Rule {
        name: "authenticated",
        applies: |_| true,
        outcome: TenantResolver::authenticated,
    },
];

/// Names of the rules in evaluation order.
pub fn rule_order() -> Vec<&'static str> {
    RULES.iter().map(|rule| rule.name).collect()
}

#[derive(Debug, Clone)]
pub struct TenantResolver {
    tenancy: TenancyConfig,
    routes: RouteTable,
    urls: TenantUrlBuilder,
    login_path: String,
    dashboard_path: String,
}

impl TenantResolver {
    pub fn new(tenancy: &TenancyConfig, routes: &RoutesConfig) -> Self {
        Self {
            tenancy: tenancy.clone(),
            routes: RouteTable::new(routes, tenancy),
            urls: TenantUrlBuilder::new(tenancy),
            login_path: routes.login_path.clone(),
            dashboard_path: routes.dashboard_path.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.tenancy, &config.routes)
    }

    /// True for paths the resolver never inspects; callers can skip the
    /// principal lookup for these.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.routes.is_bypassed(path)
    }

    pub fn host_kind(&self, host: Option<&str>) -> HostKind {
        HostKind::parse(host, &self.tenancy)
    }

    pub fn resolve(&self, facts: &RequestFacts<'_>, principal: Option<&Principal>) -> Resolution {
        let ctx = Context {
            host: self.host_kind(facts.host),
            class: self.routes.classify(facts.path),
            path: facts.path,
            query: facts.query,
            principal,
        };

        // The last rule always applies
        let rule = RULES
            .iter()
            .find(|rule| (rule.applies)(&ctx))
            .unwrap_or(&RULES[RULES.len() - 1]);
        let (decision, reason, tenant) = (rule.outcome)(self, &ctx);

        Resolution {
            decision,
            rule: rule.name,
            reason,
            tenant,
        }
    }

    fn login(&self, reason: DecisionReason) -> Outcome {
        (
            RoutingDecision::Redirect {
                location: self.login_path.clone(),
            },
            reason,
            None,
        )
    }

    /// Sends the caller to `path` inside their own tenant: a rewrite when the
    /// canonical URL is a local path, a redirect otherwise.
    ///
    /// `query` is appended to redirect targets. Rewrites never carry it here;
    /// the middleware keeps the request's own query string on the new URI.
    fn to_tenant(
        &self,
        slug: &TenantSlug,
        path: &str,
        query: Option<&str>,
        reason: DecisionReason,
    ) -> Outcome {
        match self.urls.build(slug, path) {
            Ok(TenantTarget::Internal(path)) => {
                (RoutingDecision::Rewrite { path }, reason, Some(slug.clone()))
            }
            Ok(TenantTarget::External(mut url)) => {
                url.set_query(query.filter(|q| !q.is_empty()));
                (
                    RoutingDecision::Redirect {
                        location: url.to_string(),
                    },
                    reason,
                    Some(slug.clone()),
                )
            }
            Err(_) => self.login(DecisionReason::TenantUrlUnavailable),
        }
    }

    fn tenant_scoped(&self, ctx: &Context<'_>) -> Outcome {
        let Some(principal) = ctx.principal else {
            return self.login(DecisionReason::NotAuthenticated);
        };
        let Some(bound) = principal.tenant.as_ref() else {
            return self.login(DecisionReason::MissingTenantBinding);
        };

        match &ctx.class {
            PathClass::TenantScoped { tenant: Some(requested) } if requested == bound => (
                RoutingDecision::PassThrough,
                DecisionReason::TenantScopeGranted,
                Some(bound.clone()),
            ),
            _ => self.login(DecisionReason::TenantAccessDenied),
        }
    }

    fn apex(&self, ctx: &Context<'_>) -> Outcome {
        if let Some(bound) = ctx.bound_tenant() {
            return self.to_tenant(bound, &self.dashboard_path, None, DecisionReason::ApexToTenant);
        }

        // The login page lives on the apex too
        if matches!(ctx.class, PathClass::Public) {
            return (RoutingDecision::PassThrough, DecisionReason::ApexPublic, None);
        }

        match ctx.principal {
            Some(_) => self.login(DecisionReason::MissingTenantBinding),
            None => self.login(DecisionReason::NotAuthenticated),
        }
    }

    fn public(&self, ctx: &Context<'_>) -> Outcome {
        match ctx.bound_tenant() {
            Some(bound) => {
                self.to_tenant(bound, &self.dashboard_path, None, DecisionReason::PublicToDashboard)
            }
            None => (RoutingDecision::PassThrough, DecisionReason::PublicAnonymous, None),
        }
    }

    fn protected(&self, ctx: &Context<'_>) -> Outcome {
        let Some(principal) = ctx.principal else {
            return self.login(DecisionReason::NotAuthenticated);
        };
        let Some(bound) = principal.tenant.as_ref() else {
            return self.login(DecisionReason::MissingTenantBinding);
        };

        match ctx.host.tenant() {
            Some(requested) if requested == bound => (
                RoutingDecision::Rewrite {
                    path: self.urls.canonical_internal_path(bound, ctx.path),
                },
                DecisionReason::TenantRewrite,
                Some(bound.clone()),
            ),
            Some(_) => self.to_tenant(bound, ctx.path, ctx.query, DecisionReason::TenantMismatch),
            None => self.to_tenant(bound, ctx.path, ctx.query, DecisionReason::TenantFromSession),
        }
    }

    fn authenticated(&self, ctx: &Context<'_>) -> Outcome {
        match ctx.principal {
            None => self.login(DecisionReason::NotAuthenticated),
            Some(principal) => match principal.tenant.as_ref() {
                None => self.login(DecisionReason::MissingTenantBinding),
                Some(bound) => (
                    RoutingDecision::PassThrough,
                    DecisionReason::Authenticated,
                    Some(bound.clone()),
                ),
            },
        }
    }
}
