//! Health check and public clinic configuration

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub mirror: &'static str,
    /// Purchases waiting in the mirror outbox; absent if it could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_mirrors: Option<usize>,
}

#[derive(Serialize)]
pub struct ClinicConfigResponse {
    pub clinic_name: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };

    let pending_mirrors = state.outbox.pending().await.ok().map(|p| p.len());

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        mirror: state.mirror.backend_tag(),
        pending_mirrors,
    })
}

/// Clinic name for the portals' header
pub async fn clinic_config(State(state): State<AppState>) -> Json<ClinicConfigResponse> {
    Json(ClinicConfigResponse {
        clinic_name: state.config.clinic.name.clone(),
    })
}
