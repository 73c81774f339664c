use anyhow::Context;
use casestream_gateway::{app, config, init_logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, CASESTREAM_BASE_DOMAIN, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    init_logging(&config.api.log_level);

    config.validate().context("Refusing to start with invalid configuration")?;
    tracing::info!(
        "Starting casestream gateway in {:?} mode (base domain {}, tenant URLs: {})",
        config.environment,
        config.tenancy.base_domain,
        config.tenancy.url_mode
    );

    let app = app(AppState::from_config(config.clone()));

    let bind_addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("casestream gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
