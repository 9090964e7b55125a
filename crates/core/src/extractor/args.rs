//! Variant-selector to yt-dlp argument mapping.
//!
//! The format-string fallback chains mirror what yt-dlp itself recommends:
//! an exact format id merge can fail on some videos, so each explicit
//! request degrades to best-compatible and then to best-overall. No forced
//! re-encode is ever requested; whatever container the tool natively
//! produces is accepted.

use std::path::Path;

/// What encoding variant the client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSelector {
    /// Extract audio only, transcoding to the given codec (mp3 if absent).
    Audio { format: Option<String> },
    /// Download video, optionally pinned to an exact format id, with or
    /// without an audio stream.
    Video {
        format_id: Option<String>,
        include_audio: bool,
    },
}

impl VariantSelector {
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::Audio { .. })
    }
}

/// Output template binding the job identifier into every artifact name, so
/// all files the tool writes are discoverable by prefix.
pub fn output_template(temp_dir: &Path, job_id: &str) -> String {
    temp_dir
        .join(format!("{job_id}_%(title)s.%(ext)s"))
        .to_string_lossy()
        .to_string()
}

/// Builds the full yt-dlp argument list for a download job.
pub fn build_args(selector: &VariantSelector, output_template: &str, url: &str) -> Vec<String> {
    let mut args = vec![
        "--no-playlist".to_string(),
        "--write-info-json".to_string(),
        "--output".to_string(),
        output_template.to_string(),
    ];

    match selector {
        VariantSelector::Audio { format } => {
            args.push("--extract-audio".to_string());
            args.push("--audio-format".to_string());
            args.push(format.clone().unwrap_or_else(|| "mp3".to_string()));
        }
        VariantSelector::Video {
            format_id,
            include_audio,
        } => {
            let format_string = match (format_id.as_deref(), include_audio) {
                // Exact format merged with best audio, degrading to best
                // compatible pair, then best overall
                (Some(id), true) if id != "best" => {
                    format!("{id}+bestaudio/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best")
                }
                // Exact format alone, no audio stream
                (Some(id), false) if id != "best" => id.to_string(),
                // Auto with audio: best compatible combination first
                (_, true) => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
                // Auto without audio: best video-only stream
                (_, false) => "bestvideo[ext=mp4]/bestvideo".to_string(),
            };
            args.push("--format".to_string());
            args.push(format_string);

            args.push("--embed-thumbnail".to_string());
            args.push("--embed-metadata".to_string());
        }
    }

    args.push(url.to_string());
    args
}
