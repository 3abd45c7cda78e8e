//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state.storage.health_check().await {
        Ok(true) => "available",
        _ => "unavailable",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        live_tokens: state.store.len(),
        storage: storage.to_string(),
    })
}
