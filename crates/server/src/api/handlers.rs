use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use clipfetch_core::SanitizedConfig;

use crate::metrics::{encode_metrics, JOBS_ACTIVE};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    JOBS_ACTIVE.set(state.active_jobs() as i64);
    encode_metrics()
}
