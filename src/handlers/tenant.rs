// handlers/tenant.rs - GET /tenant/:slug[/*rest]

use axum::{
    extract::{Path, RawQuery},
    Extension,
};
use serde::Deserialize;

use super::public::PageView;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiResult, ApiResponse, OriginalPath, ResolvedTenant};
use crate::tenant::TenantSlug;

#[derive(Debug, Deserialize)]
pub struct TenantPathParams {
    pub slug: String,
    #[serde(default)]
    pub rest: Option<String>,
}

/// GET /tenant/:slug[/*rest] - a page inside one tenant
///
/// The resolver only lets a caller in here for their own tenant; the check is
/// repeated so the handler is safe even when mounted without the middleware.
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "page": "cases", "path": "/cases/7", "tenant": "acme", "subject": "user-1", "rule": "protected" } }
/// ```
pub async fn tenant_page(
    Path(params): Path<TenantPathParams>,
    RawQuery(query): RawQuery,
    principal: Option<Extension<Principal>>,
    original: Option<Extension<OriginalPath>>,
    resolved: Option<Extension<ResolvedTenant>>,
) -> ApiResult<PageView> {
    let slug = TenantSlug::parse(&params.slug)
        .map_err(|_| ApiError::not_found(format!("Unknown tenant '{}'", params.slug)))?;

    let Some(Extension(principal)) = principal else {
        return Err(ApiError::unauthorized("Authentication required"));
    };
    if principal.tenant.as_ref() != Some(&slug) {
        tracing::warn!(
            subject = %principal.subject,
            requested = %slug,
            "Tenant page denied"
        );
        return Err(ApiError::forbidden("Access to this tenant is not allowed"));
    }

    let rest = params.rest.unwrap_or_default();
    let page = rest
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("home")
        .to_string();
    let path = match original {
        Some(Extension(OriginalPath(path))) => path,
        None => format!("/{}", rest.trim_start_matches('/')),
    };

    Ok(ApiResponse::success(PageView {
        page,
        path,
        tenant: Some(slug),
        subject: Some(principal.subject),
        query,
        rule: resolved.map(|Extension(resolved)| resolved.rule),
    }))
}
