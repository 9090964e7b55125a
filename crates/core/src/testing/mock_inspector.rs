//! Mock variant inspector for testing without a yt-dlp binary.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::extractor::{
    ExtractorError, VariantFormat, VariantGroups, VariantInspector, VideoInfo,
};

/// Inspector returning canned responses.
pub struct MockInspector {
    response: Mutex<Option<VideoInfo>>,
    fail_with: Mutex<Option<String>>,
}

impl MockInspector {
    pub fn new() -> Self {
        Self {
            response: Mutex::new(None),
            fail_with: Mutex::new(None),
        }
    }

    /// Sets the response returned by the next `inspect` calls.
    pub fn set_response(&self, info: VideoInfo) {
        *self.response.lock().unwrap() = Some(info);
    }

    /// Makes `inspect` fail with the given reason.
    pub fn set_failure(&self, reason: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(reason.into());
    }
}

impl Default for MockInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VariantInspector for MockInspector {
    async fn inspect(&self, _url: &str) -> Result<VideoInfo, ExtractorError> {
        if let Some(reason) = self.fail_with.lock().unwrap().clone() {
            return Err(ExtractorError::InspectFailed { reason });
        }
        Ok(self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(sample_video_info))
    }
}

/// A small plausible inspection result.
pub fn sample_video_info() -> VideoInfo {
    let combined = VariantFormat {
        format_id: "18".to_string(),
        format_note: "360p".to_string(),
        ext: "mp4".to_string(),
        resolution: Some("640x360".to_string()),
        filesize: Some(10_000_000),
        filesize_approx: None,
        vcodec: Some("avc1.42001E".to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        fps: Some(30.0),
        height: Some(360),
        width: Some(640),
        tbr: Some(500.0),
        abr: Some(96.0),
    };

    VideoInfo {
        id: "sample".to_string(),
        title: "Sample Video".to_string(),
        description: "A test fixture".to_string(),
        duration: Some(212.0),
        view_count: Some(12345),
        uploader: Some("Test Channel".to_string()),
        upload_date: Some("20240101".to_string()),
        thumbnail: None,
        webpage_url: Some("https://youtu.be/sample".to_string()),
        formats: VariantGroups {
            combined: vec![combined.clone()],
            video_only: vec![],
            audio_only: vec![],
            all_video: vec![combined.clone()],
        },
        available_formats: vec![combined],
    }
}
