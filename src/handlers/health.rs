// handlers/health.rs - GET /health

use serde_json::{json, Value};

use crate::middleware::ApiResponse;

pub async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
