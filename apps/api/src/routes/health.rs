use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Portfolio analysis and text task API",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// GET /health
/// Liveness only; does not probe upstream services.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}
