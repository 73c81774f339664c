// handlers/auth.rs - session endpoints under /api/auth
//
// These paths are bypassed by the tenant resolver, so each handler reads the
// session itself.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::clear_session_cookie_header;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::tenant::{check_slug_availability, SlugAvailability};

/// GET /api/auth/me - the signed-in user
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "user": { "subject": "user-1", "tenant": "acme" } } }
/// ```
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let principal = state
        .identity
        .current_principal(&headers)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if principal.tenant.is_none() {
        return Err(ApiError::not_found("User is not bound to an account"));
    }

    Ok(ApiResponse::success(json!({ "user": principal })))
}

/// POST /api/auth/logout - clears the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie_header(
        &state.config.security.session_cookie,
        state.config.security.require_https,
    );

    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::success(json!({ "message": "Logged out successfully" })),
    )
}

#[derive(Debug, Deserialize)]
pub struct CheckSlugQuery {
    pub slug: Option<String>,
}

/// GET /api/auth/check-slug?slug= - whether a new account can claim a slug
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "slug": "acme", "available": false, "reason": "taken" } }
/// ```
pub async fn check_slug(
    State(state): State<AppState>,
    Query(query): Query<CheckSlugQuery>,
) -> ApiResult<SlugAvailability> {
    let raw = query
        .slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Slug parameter is required"))?;

    let availability = check_slug_availability(
        state.directory.as_ref(),
        &state.config.tenancy.reserved_slugs,
        &raw,
    )
    .await?;

    Ok(ApiResponse::success(availability))
}
