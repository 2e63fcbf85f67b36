//! Service info and health handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Model family served by the generator.
pub const MODEL_NAME: &str = "LTX-2 19B";

/// `GET /` response.
#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub status: String,
    pub model: String,
    pub version: String,
    pub models_ready: bool,
    pub missing_models: Vec<String>,
}

/// `GET /health` response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub models_ready: bool,
    pub missing_models: Vec<String>,
}

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let missing_models = state.generator.missing_models();
    Json(ServiceInfo {
        service: "reel-api".to_string(),
        status: "running".to_string(),
        model: MODEL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models_ready: missing_models.is_empty(),
        missing_models,
    })
}

/// Liveness plus model readiness. Always 200; `status` tells the two apart.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let missing_models = state.generator.missing_models();
    let models_ready = missing_models.is_empty();
    Json(HealthResponse {
        status: if models_ready { "healthy" } else { "models_missing" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        models_ready,
        missing_models,
    })
}
