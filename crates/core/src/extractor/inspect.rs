//! One-shot variant inspection via `yt-dlp --dump-json`.
//!
//! Returns the set of available encoding variants for a URL so the client
//! can populate its format pickers. This is a request/response boundary to
//! the extraction tool; nothing here touches the download pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::process::Command;

use super::error::ExtractorError;

/// Maximum length of the description forwarded to clients.
const DESCRIPTION_LIMIT: usize = 300;

/// A single encoding variant as reported by yt-dlp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantFormat {
    pub format_id: String,
    #[serde(default)]
    pub format_note: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub resolution: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    pub fps: Option<f32>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub tbr: Option<f32>,
    pub abr: Option<f32>,
}

impl VariantFormat {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|c| c != "none")
    }

    fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|c| c != "none")
    }

    fn is_h264(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|c| c.contains("avc"))
            || self.format_id == "22"
            || self.format_id == "18"
    }

    fn size_estimate(&self) -> u64 {
        self.filesize
            .or(self.filesize_approx)
            .unwrap_or(self.tbr.unwrap_or(0.0) as u64)
    }

    /// Human-readable quality label shown in format pickers.
    pub fn quality_label(&self) -> String {
        if self.has_audio() && !self.has_video() {
            return match self.abr {
                Some(abr) => format!("Audio {}kbps", abr as u32),
                None => "Audio Only".to_string(),
            };
        }
        if let Some(height) = self.height {
            let mut label = format!("{height}p");
            if self.fps.is_some_and(|fps| fps >= 60.0) {
                label.push_str(" 60fps");
            }
            return label;
        }
        if !self.format_note.is_empty() {
            return self.format_note.clone();
        }
        self.format_id.clone()
    }
}

/// Variants grouped the way the client consumes them.
#[derive(Debug, Clone, Serialize)]
pub struct VariantGroups {
    /// Formats carrying both streams (rare for YouTube, usually 360p).
    pub combined: Vec<VariantFormat>,
    pub video_only: Vec<VariantFormat>,
    pub audio_only: Vec<VariantFormat>,
    /// One best downloadable format per resolution, highest first.
    pub all_video: Vec<VariantFormat>,
}

/// Result of inspecting a URL.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
    pub formats: VariantGroups,
    /// Flattened list for dropdowns, sorted by quality descending.
    pub available_formats: Vec<VariantFormat>,
}

/// Metadata lookup boundary, mockable for tests.
#[async_trait]
pub trait VariantInspector: Send + Sync {
    async fn inspect(&self, url: &str) -> Result<VideoInfo, ExtractorError>;
}

/// Inspector backed by the real yt-dlp binary.
pub struct YtDlpInspector {
    yt_dlp_path: PathBuf,
}

impl YtDlpInspector {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self { yt_dlp_path }
    }
}

#[async_trait]
impl VariantInspector for YtDlpInspector {
    async fn inspect(&self, url: &str) -> Result<VideoInfo, ExtractorError> {
        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-download", url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::ExecutableNotFound {
                        path: self.yt_dlp_path.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ExtractorError::inspect_failed(format!(
                "yt-dlp exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_video_info(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Raw `--dump-json` payload shape, only the fields we care about.
#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    uploader: Option<String>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<VariantFormat>,
}

/// Parses and organizes yt-dlp's JSON metadata dump.
pub fn parse_video_info(json: &str) -> Result<VideoInfo, ExtractorError> {
    let raw: RawVideoInfo = serde_json::from_str(json)
        .map_err(|e| ExtractorError::parse_error(format!("bad yt-dlp JSON: {e}")))?;

    let mut formats: Vec<VariantFormat> = raw
        .formats
        .into_iter()
        .filter(|f| {
            !f.ext.is_empty()
                && f.ext != "mhtml"
                && f.ext != "none"
                && (f.has_video() || f.has_audio())
        })
        .map(|mut f| {
            f.format_note = f.quality_label();
            f
        })
        .collect();

    // Quality (height) descending, then size descending
    formats.sort_by(|a, b| {
        b.height
            .unwrap_or(0)
            .cmp(&a.height.unwrap_or(0))
            .then(b.size_estimate().cmp(&a.size_estimate()))
    });

    let combined: Vec<VariantFormat> = formats
        .iter()
        .filter(|f| f.has_video() && f.has_audio())
        .cloned()
        .collect();
    let video_only: Vec<VariantFormat> = formats
        .iter()
        .filter(|f| f.has_video() && !f.has_audio())
        .cloned()
        .collect();
    let audio_only: Vec<VariantFormat> = formats
        .iter()
        .filter(|f| !f.has_video() && f.has_audio())
        .cloned()
        .collect();

    let all_video = pick_best_per_resolution(&combined, &video_only);

    let description = raw
        .description
        .map(|d| {
            if d.len() > DESCRIPTION_LIMIT {
                let cut = d
                    .char_indices()
                    .take_while(|(i, _)| *i < DESCRIPTION_LIMIT)
                    .last()
                    .map(|(i, c)| i + c.len_utf8())
                    .unwrap_or(0);
                format!("{}...", &d[..cut])
            } else {
                d
            }
        })
        .unwrap_or_default();

    Ok(VideoInfo {
        id: raw.id,
        title: raw.title,
        description,
        duration: raw.duration,
        view_count: raw.view_count,
        uploader: raw.uploader,
        upload_date: raw.upload_date,
        thumbnail: raw.thumbnail,
        webpage_url: raw.webpage_url,
        formats: VariantGroups {
            combined,
            video_only,
            audio_only,
            all_video,
        },
        available_formats: formats,
    })
}

/// Picks one best downloadable format per resolution: combined formats and
/// mp4 video-only candidates, preferring audio presence, then H.264, then
/// size/bitrate.
fn pick_best_per_resolution(
    combined: &[VariantFormat],
    video_only: &[VariantFormat],
) -> Vec<VariantFormat> {
    let candidates = combined.iter().chain(
        video_only
            .iter()
            .filter(|f| f.ext == "mp4" && f.height.is_some_and(|h| h >= 144)),
    );

    let mut by_height: HashMap<u32, Vec<&VariantFormat>> = HashMap::new();
    for format in candidates {
        if let Some(height) = format.height {
            by_height.entry(height).or_default().push(format);
        }
    }

    let mut best: Vec<VariantFormat> = by_height
        .into_values()
        .map(|mut formats| {
            formats.sort_by(|a, b| {
                b.has_audio()
                    .cmp(&a.has_audio())
                    .then(b.is_h264().cmp(&a.is_h264()))
                    .then(b.size_estimate().cmp(&a.size_estimate()))
            });
            formats[0].clone()
        })
        .collect();

    best.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(
        id: &str,
        ext: &str,
        height: Option<u32>,
        vcodec: &str,
        acodec: &str,
    ) -> VariantFormat {
        VariantFormat {
            format_id: id.to_string(),
            format_note: String::new(),
            ext: ext.to_string(),
            resolution: None,
            filesize: None,
            filesize_approx: None,
            vcodec: Some(vcodec.to_string()),
            acodec: Some(acodec.to_string()),
            fps: None,
            height,
            width: None,
            tbr: None,
            abr: None,
        }
    }

    #[test]
    fn test_quality_label_video() {
        let mut f = format("137", "mp4", Some(1080), "avc1.640028", "none");
        assert_eq!(f.quality_label(), "1080p");
        f.fps = Some(60.0);
        assert_eq!(f.quality_label(), "1080p 60fps");
    }

    #[test]
    fn test_quality_label_audio() {
        let mut f = format("140", "m4a", None, "none", "mp4a.40.2");
        f.abr = Some(129.5);
        assert_eq!(f.quality_label(), "Audio 129kbps");
        f.abr = None;
        assert_eq!(f.quality_label(), "Audio Only");
    }

    #[test]
    fn test_parse_filters_metadata_formats() {
        let json = r#"{
            "id": "xyz",
            "title": "Test Video",
            "description": "short",
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.0},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080},
                {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360}
            ]
        }"#;

        let info = parse_video_info(json).unwrap();
        assert_eq!(info.id, "xyz");
        assert_eq!(info.available_formats.len(), 3);
        assert_eq!(info.formats.combined.len(), 1);
        assert_eq!(info.formats.video_only.len(), 1);
        assert_eq!(info.formats.audio_only.len(), 1);
        // Sorted by height descending
        assert_eq!(info.available_formats[0].format_id, "137");
    }

    #[test]
    fn test_best_per_resolution_prefers_audio_then_h264() {
        let combined = vec![format("18", "mp4", Some(360), "avc1.42001E", "mp4a.40.2")];
        let video_only = vec![
            format("137", "mp4", Some(1080), "avc1.640028", "none"),
            format("248", "webm", Some(1080), "vp9", "none"),
            format("vo360", "mp4", Some(360), "vp9", "none"),
        ];

        let best = pick_best_per_resolution(&combined, &video_only);
        assert_eq!(best.len(), 2);
        // 1080p: webm candidate was filtered, h264 wins
        assert_eq!(best[0].format_id, "137");
        // 360p: combined (has audio) beats video-only
        assert_eq!(best[1].format_id, "18");
    }

    #[test]
    fn test_description_truncated() {
        let long = "a".repeat(500);
        let json = format!(
            r#"{{"id": "x", "title": "t", "description": "{long}", "formats": []}}"#
        );
        let info = parse_video_info(&json).unwrap();
        assert_eq!(info.description.len(), DESCRIPTION_LIMIT + 3);
        assert!(info.description.ends_with("..."));
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(matches!(
            parse_video_info("not json"),
            Err(ExtractorError::ParseError { .. })
        ));
    }
}
