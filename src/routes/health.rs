use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub quotations: usize,
    pub autosave: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let quotations = state.store.count();
    let autosave = if state.settings.snapshot_dir.is_some() {
        "directory"
    } else {
        "log_only"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        quotations,
        autosave: autosave.to_string(),
    })
}
