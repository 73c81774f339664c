//! casestream gateway: tenant resolution in front of the casestream web app.
//!
//! Each law firm is one tenant, reached through its own subdomain
//! (`acme.casestream.com`). The [`tenant`] module decides per request whether
//! to pass it through, rewrite it into the internal `/tenant/{slug}` path
//! space, or redirect it; [`middleware::tenant`] applies that decision to axum
//! requests. [`app`] assembles the full service.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod tenant;

use axum::{
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;

/// Builds the service: routes wrapped by the tenant resolver, then CORS and
/// request tracing.
///
/// The resolver wraps the routed app instead of being added with
/// `Router::layer`, because a layer on the router runs after routing and a
/// rewritten URI would never reach `/tenant/...`.
pub fn app(state: AppState) -> Router {
    let routes = routes().with_state(state.clone());
    let resolved = from_fn_with_state(state.clone(), middleware::resolve_tenant_middleware).layer(routes);

    let mut app = Router::new().fallback_service(resolved);

    if state.config.security.enable_cors {
        app = app.layer(build_cors_layer(&state.config));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn routes() -> Router<AppState> {
    Router::new()
        // Public pages
        .route("/", get(handlers::public_page))
        .route("/login", get(handlers::public_page))
        .route("/signup", get(handlers::public_page))
        .route("/forgot-password", get(handlers::public_page))
        // Tenant-scoped pages (reached through rewrites)
        .route("/tenant/:slug", get(handlers::tenant_page))
        .route("/tenant/:slug/*rest", get(handlers::tenant_page))
        // Session API
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/check-slug", get(handlers::auth::check_slug))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;

    // Credentialed CORS cannot be combined with a wildcard origin
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|o| o.trim().parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("casestream_gateway={},tower_http=debug", level))
    });

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}
