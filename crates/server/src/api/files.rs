//! File retrieval endpoint.
//!
//! Serves a completed download once, then hands the file over to the grace
//! reaper. Both rejection paths (id-prefix mismatch, path escape) fire
//! before any filesystem access.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, info};

use clipfetch_core::{content_type_for, StoreError};

use crate::metrics::FILES_SERVED;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Retrieve a downloaded file
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Path((download_id, filename)): Path<(String, String)>,
) -> Response {
    // The filename must carry the job identifier as its prefix; anything
    // else is a cross-job access attempt
    if !filename.starts_with(&download_id) {
        debug!("Rejected retrieval: {} not prefixed by {}", filename, download_id);
        return error_response(StatusCode::FORBIDDEN, "Invalid file access");
    }

    let path = match state.store().resolve(&filename) {
        Ok(path) => path,
        Err(StoreError::PathEscape { .. }) => {
            debug!("Rejected retrieval: {} escapes store root", filename);
            return error_response(StatusCode::FORBIDDEN, "Invalid file path");
        }
        Err(e) => {
            error!("Failed to resolve {}: {}", filename, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serve file");
        }
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return error_response(StatusCode::NOT_FOUND, "File not found");
        }
        Err(e) => {
            error!("Failed to read {}: {}", filename, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serve file");
        }
    };

    // Client-facing name drops the internal id prefix
    let clean_filename = filename.replacen(&format!("{download_id}_"), "", 1);
    let disposition = format!("attachment; filename=\"{clean_filename}\"");

    // The file and its sidecar are deleted once the grace window passes
    state
        .reaper()
        .schedule_grace_delete(&download_id, state.grace_delete_delay());

    FILES_SERVED.inc();
    info!("Serving {} ({} bytes)", filename, bytes.len());

    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&filename)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}
