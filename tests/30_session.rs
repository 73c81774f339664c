mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;

    let res = server.client()?.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn dashboard_with_session_is_served_from_tenant_space() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;
    let token = common::token(&server.config, "user-1", Some("acme"));

    let res = server
        .client()?
        .get(server.url("/dashboard"))
        .header(header::COOKIE, common::session_cookie(&server.config, &token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tenant"], "acme");
    assert_eq!(body["data"]["page"], "dashboard");
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_accepted() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;
    let token = common::token(&server.config, "user-1", Some("globex"));

    let res = server
        .client()?
        .get(server.url("/settings"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tenant"], "globex");
    Ok(())
}

#[tokio::test]
async fn anonymous_dashboard_redirects_to_login() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;

    let res = server.client()?.get(server.url("/dashboard")).send().await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login")
    );
    Ok(())
}

#[tokio::test]
async fn signed_in_login_page_redirects_to_dashboard() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;
    let token = common::token(&server.config, "user-1", Some("acme"));

    // Path-mode tenant URLs are served by rewrite, so the dashboard comes back directly
    let res = server
        .client()?
        .get(server.url("/login"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["page"], "dashboard");
    assert_eq!(body["data"]["tenant"], "acme");
    Ok(())
}

#[tokio::test]
async fn me_returns_current_principal() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;
    let client = server.client()?;

    let res = client.get(server.url("/api/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let token = common::token(&server.config, "user-1", Some("acme"));
    let res = client
        .get(server.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user"]["subject"], "user-1");
    assert_eq!(body["data"]["user"]["tenant"], "acme");

    let res = client
        .get(server.url("/api/auth/me"))
        .bearer_auth("garbage")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let unbound = common::token(&server.config, "user-2", None);
    let res = client
        .get(server.url("/api/auth/me"))
        .bearer_auth(&unbound)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_cookie() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;

    let res = server.client()?.post(server.url("/api/auth/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("cs_session=;"), "{}", cookie);
    assert!(cookie.contains("Max-Age=0"), "{}", cookie);
    Ok(())
}

#[tokio::test]
async fn check_slug_reports_availability() -> Result<()> {
    let server = TestServer::start(common::test_config()).await?;
    let client = server.client()?;

    let body: Value = client
        .get(server.url("/api/auth/check-slug?slug=initech"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["available"], true);
    assert_eq!(body["data"]["slug"], "initech");

    let body: Value = client
        .get(server.url("/api/auth/check-slug?slug=Acme"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["available"], false);
    assert_eq!(body["data"]["slug"], "acme");

    let body: Value = client
        .get(server.url("/api/auth/check-slug?slug=admin"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["available"], false);
    assert_eq!(body["data"]["reason"], "reserved");

    let res = client.get(server.url("/api/auth/check-slug")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url("/api/auth/check-slug?slug=-acme"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
