//! Variant inspection endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::AppState;

/// Request body for inspecting a URL
#[derive(Debug, Deserialize)]
pub struct VideoInfoBody {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// List the available encoding variants for a URL
pub async fn inspect(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VideoInfoBody>,
) -> impl IntoResponse {
    let url = match body.url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, "URL is required").into_response(),
    };

    if !state.is_allowed_url(url) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid YouTube URL").into_response();
    }

    match state.inspector().inspect(url).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => {
            error!("Variant inspection failed for {}: {}", url, e);
            error_response(
                StatusCode::BAD_GATEWAY,
                "Failed to fetch video information",
            )
            .into_response()
        }
    }
}
