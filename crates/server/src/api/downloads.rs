//! Download submission endpoint.
//!
//! Accepts a URL plus variant selector and responds with a live SSE stream
//! of JSON progress payloads. The stream carries any number of `downloading`
//! snapshots and closes right after the single terminal event.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use clipfetch_core::{Job, VariantSelector};

use crate::state::AppState;

/// Request body for submitting a download
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDownloadBody {
    pub url: Option<String>,
    /// Format id for video, or audio codec when `audioOnly` is set.
    pub format: Option<String>,
    #[serde(default)]
    pub audio_only: bool,
    /// Defaults to true: a plain video request gets sound.
    #[serde(default = "default_include_audio")]
    pub include_audio: bool,
}

fn default_include_audio() -> bool {
    true
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

impl SubmitDownloadBody {
    fn selector(&self) -> VariantSelector {
        if self.audio_only {
            VariantSelector::Audio {
                format: self.format.clone(),
            }
        } else {
            VariantSelector::Video {
                format_id: self.format.clone(),
                include_audio: self.include_audio,
            }
        }
    }
}

/// Submit a download job
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitDownloadBody>,
) -> impl IntoResponse {
    let url = match body.url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, "URL is required").into_response(),
    };

    if !state.is_allowed_url(url) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid YouTube URL").into_response();
    }

    let permit = match state.try_acquire_job_slot() {
        Ok(permit) => permit,
        Err(_) => {
            warn!("Rejecting download: concurrency cap reached");
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many concurrent downloads",
            )
            .into_response();
        }
    };

    if let Err(e) = state.store().ensure_root().await {
        error!("Failed to create temp directory: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start download")
            .into_response();
    }

    let job = Job::new(url, body.selector());
    info!("Starting download job {} for {}", job.id, job.url);

    // The job task owns the permit: the slot stays claimed until the job
    // reaches a terminal state, even if the client disconnects first
    let events = state.runner().run_with_slot(job, Some(permit));

    let stream = stream::unfold(events, |mut events| async move {
        let event = events.recv().await?;
        let sse_event = match Event::default().json_data(&event) {
            Ok(sse_event) => sse_event,
            Err(e) => {
                error!("Failed to serialize job event: {}", e);
                Event::default().data("{}")
            }
        };
        Some((Ok::<_, Infallible>(sse_event), events))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
