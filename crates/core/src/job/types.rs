//! Job data model and client-facing event payloads.

use serde::Serialize;
use uuid::Uuid;

use crate::extractor::VariantSelector;

/// One user-initiated request to produce a downloadable artifact.
#[derive(Debug, Clone)]
pub struct Job {
    /// Opaque identifier, used as filename prefix and client correlation
    /// key. Fixed-length, so no id can be a prefix of another.
    pub id: String,
    pub url: String,
    pub selector: VariantSelector,
}

impl Job {
    pub fn new(url: impl Into<String>, selector: VariantSelector) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            url: url.into(),
            selector,
        }
    }
}

/// Event published to the client stream for one job.
///
/// Serializes to the exact wire shapes the client consumes: a `downloading`
/// snapshot, a single `completed` payload, or a single `error` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobEvent {
    Progress(ProgressPayload),
    Completed(CompletedPayload),
    Failed(FailedPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub progress: f32,
    pub filename: String,
    pub status: &'static str,
    pub download_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPayload {
    pub progress: f32,
    pub filename: String,
    pub status: &'static str,
    pub download_id: String,
    pub download_url: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPayload {
    pub progress: f32,
    pub filename: String,
    pub status: &'static str,
    pub error: String,
}

impl JobEvent {
    pub fn progress(download_id: &str, percent: f32, filename: Option<&str>) -> Self {
        Self::Progress(ProgressPayload {
            progress: percent,
            filename: filename.unwrap_or_default().to_string(),
            status: "downloading",
            download_id: download_id.to_string(),
        })
    }

    pub fn completed(download_id: &str, filename: &str, file_size: u64) -> Self {
        let download_url = format!(
            "/api/v1/files/{}/{}",
            download_id,
            urlencoding::encode(filename)
        );
        Self::Completed(CompletedPayload {
            progress: 100.0,
            filename: filename.to_string(),
            status: "completed",
            download_id: download_id.to_string(),
            download_url,
            file_size,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(FailedPayload {
            progress: 0.0,
            filename: String::new(),
            status: "error",
            error: error.into(),
        })
    }

    /// Terminal events end the job's event sequence permanently.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique_and_fixed_length() {
        let a = Job::new("https://youtu.be/x", VariantSelector::Audio { format: None });
        let b = Job::new("https://youtu.be/x", VariantSelector::Audio { format: None });
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert_eq!(b.id.len(), 32);
    }

    #[test]
    fn test_progress_event_wire_shape() {
        let event = JobEvent::progress("abc", 42.5, Some("abc_movie.mp4"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["progress"], 42.5);
        assert_eq!(json["filename"], "abc_movie.mp4");
        assert_eq!(json["status"], "downloading");
        assert_eq!(json["downloadId"], "abc");
    }

    #[test]
    fn test_completed_event_encodes_filename_in_url() {
        let event = JobEvent::completed("abc", "abc_My Movie.mp4", 1024);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progress"], 100.0);
        assert_eq!(json["fileSize"], 1024);
        assert_eq!(
            json["downloadUrl"],
            "/api/v1/files/abc/abc_My%20Movie.mp4"
        );
    }

    #[test]
    fn test_failed_event_wire_shape() {
        let event = JobEvent::failed("boom");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["progress"], 0.0);
        assert_eq!(json["filename"], "");
        assert_eq!(json["error"], "boom");
        assert!(event.is_terminal());
    }
}
