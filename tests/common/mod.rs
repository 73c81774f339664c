#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use casestream_gateway::auth::{issue_session_token, AuthError, IdentityProvider, JwtIdentityProvider, Principal};
use casestream_gateway::config::{AppConfig, TenantUrlMode};
use casestream_gateway::state::AppState;
use casestream_gateway::tenant::{InMemoryAccountDirectory, TenantSlug};

pub fn test_config() -> AppConfig {
    AppConfig::for_testing()
}

pub fn subdomain_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.tenancy.url_mode = TenantUrlMode::Subdomain;
    config.tenancy.url_scheme = "https".to_string();
    config
}

/// Session token for `subject`, bound to `account` when given.
pub fn token(config: &AppConfig, subject: &str, account: Option<&str>) -> String {
    let tenant = account.map(|a| TenantSlug::parse(a).expect("valid slug"));
    issue_session_token(&config.security, subject, None, tenant.as_ref()).expect("token")
}

pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    format!("{}={}", config.security.session_cookie, token)
}

/// Identity provider that counts how often it is asked for the principal.
pub struct CountingIdentity {
    inner: JwtIdentityProvider,
    calls: AtomicUsize,
}

impl CountingIdentity {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            inner: JwtIdentityProvider::from_config(&config.security),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn current_principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.current_principal(headers).await
    }
}

pub fn app_with_identity(config: AppConfig, identity: Arc<CountingIdentity>) -> Router {
    let directory = Arc::new(InMemoryAccountDirectory::with_accounts(&config.tenancy.known_accounts));
    casestream_gateway::app(AppState::new(config, identity, directory))
}

pub fn app(config: AppConfig) -> Router {
    casestream_gateway::app(AppState::from_config(config))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// GET `path` with the given `Host` and optional cookie, through the whole app.
pub async fn get(app: Router, host: &str, path: &str, cookie: Option<&str>) -> Result<TestResponse> {
    let mut builder = Request::builder().uri(path).header(header::HOST, host);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty())?).await
}

pub async fn send(app: Router, request: Request<Body>) -> Result<TestResponse> {
    let response = app.oneshot(request).await.context("request failed")?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    Ok(TestResponse { status, headers, body })
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: AppConfig,
}

impl TestServer {
    /// Serves the app on a free port inside the current test runtime.
    pub async fn start(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", port))?;
        let app = casestream_gateway::app(AppState::from_config(config.clone()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { port, base_url, config };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Client that reports redirects instead of following them.
    pub fn client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}
