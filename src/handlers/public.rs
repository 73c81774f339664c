// handlers/public.rs - GET /, /login, /signup, /forgot-password

use axum::{extract::OriginalUri, http::Uri, Extension};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ResolvedTenant};
use crate::tenant::TenantSlug;

/// What a page request resolved to. The pages themselves are rendered by the
/// front end; this service only decides which one is served.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page: String,
    pub path: String,
    pub tenant: Option<TenantSlug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Resolver rule that let the request through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
}

/// GET / | /login | /signup | /forgot-password
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "page": "login", "path": "/login", "tenant": null, "rule": "public" } }
/// ```
pub async fn public_page(uri: Uri, resolved: Option<Extension<ResolvedTenant>>) -> ApiResponse<PageView> {
    let path = uri.path().to_string();
    let page = match path.trim_matches('/') {
        "" => "home".to_string(),
        name => name.to_string(),
    };

    ApiResponse::success(PageView {
        page,
        path,
        tenant: None,
        subject: None,
        query: uri.query().map(str::to_string),
        rule: resolved.map(|Extension(resolved)| resolved.rule),
    })
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
