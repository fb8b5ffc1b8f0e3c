//! Health check handlers

use axum::{extract::State, Json};
use core_kernel::HealthCheckResult;
use serde::Serialize;

use crate::{error::ApiError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub store: HealthCheckResult,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (includes the invoice store)
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    let store = state.health.health_check().await;
    if !store.is_healthy() {
        return Err(ApiError::Unavailable(
            store.message.unwrap_or_else(|| format!("{} is not ready", store.adapter_id)),
        ));
    }

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
    }))
}
