use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::auth::Principal;
use crate::state::AppState;
use crate::tenant::{DecisionReason, RequestFacts, Resolution, RoutingDecision, TenantSlug};

/// Path the client asked for, before any rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPath(pub String);

/// Outcome of tenant resolution, for handlers downstream of the middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTenant {
    pub tenant: Option<TenantSlug>,
    pub rule: &'static str,
    pub reason: DecisionReason,
}

/// Applies the tenant resolver to every request.
///
/// Must wrap the whole router (not be added with `Router::layer`) so that a
/// rewritten URI is routed again. Bypassed paths skip the identity lookup;
/// everything else reads the principal exactly once.
pub async fn resolve_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.resolver.is_bypassed(&path) {
        return next.run(request).await;
    }

    let lookup = {
        let headers = request.headers();
        state.identity.current_principal(headers).await
    };
    let principal = match lookup {
        Ok(principal) => principal,
        Err(e) => {
            tracing::info!("Ignoring rejected session on {}: {}", path, e);
            None
        }
    };

    let host = request_host(&request);
    let query = request.uri().query().map(str::to_string);
    let facts = RequestFacts {
        host: host.as_deref(),
        path: &path,
        query: query.as_deref(),
    };
    let resolution = state.resolver.resolve(&facts, principal.as_ref());
    log_resolution(&facts, principal.as_ref(), &resolution);

    match &resolution.decision {
        RoutingDecision::PassThrough => {}
        RoutingDecision::Rewrite { path: new_path } => {
            let uri = build_uri_with_new_path(request.uri(), new_path);
            *request.uri_mut() = uri;
        }
        RoutingDecision::Redirect { location } => {
            return Redirect::temporary(location).into_response();
        }
    }

    let extensions = request.extensions_mut();
    extensions.insert(OriginalPath(path));
    extensions.insert(ResolvedTenant {
        tenant: resolution.tenant,
        rule: resolution.rule,
        reason: resolution.reason,
    });
    if let Some(principal) = principal {
        extensions.insert(principal);
    }

    next.run(request).await
}

/// Host header, falling back to the URI authority (HTTP/2).
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
}

fn log_resolution(facts: &RequestFacts<'_>, principal: Option<&Principal>, resolution: &Resolution) {
    let subject = principal.map(|p| p.subject.as_str()).unwrap_or("-");
    let host = facts.host.unwrap_or("-");

    if resolution.reason.is_fault() {
        tracing::error!(
            host,
            path = facts.path,
            subject,
            rule = resolution.rule,
            reason = ?resolution.reason,
            "Tenant resolution fell back to login"
        );
    } else if resolution.reason.is_cross_tenant() {
        tracing::warn!(
            host,
            path = facts.path,
            subject,
            rule = resolution.rule,
            reason = ?resolution.reason,
            decision = ?resolution.decision,
            "Cross-tenant request"
        );
    } else {
        tracing::debug!(
            host,
            path = facts.path,
            rule = resolution.rule,
            reason = ?resolution.reason,
            decision = ?resolution.decision,
            "Tenant resolved"
        );
    }
}

/// Replaces the path of `original`, keeping its query string.
fn build_uri_with_new_path(original: &Uri, new_path: &str) -> Uri {
    let path_and_query = match original.query() {
        Some(query) => format!("{}?{}", new_path, query),
        None => new_path.to_string(),
    };

    let path_and_query = match path_and_query.parse::<PathAndQuery>() {
        Ok(pq) => pq,
        Err(e) => {
            tracing::error!("Cannot rewrite {} to {}: {}", original, new_path, e);
            return original.clone();
        }
    };

    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).unwrap_or_else(|_| original.clone())
}
