//! Incremental parser for the extraction tool's text output.
//!
//! yt-dlp reports progress as free-form log lines. The parser holds exactly
//! two pieces of state across chunks: the last percentage seen and the last
//! output filename seen. Percent updates are last-write-wins with no
//! monotonicity enforcement, because the tool legitimately reports lower
//! percentages after a format-fallback retry.

use regex_lite::Regex;
use std::path::Path;

/// Latest parsed state for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// 0-100, as last reported by the tool.
    pub percent: f32,
    /// Bare output filename, once announced.
    pub filename: Option<String>,
}

/// Stateful text-stream interpreter for one job's process output.
pub struct ProgressParser {
    percent_re: Regex,
    /// Filename announcement patterns, in priority order. The first rule
    /// matching a chunk wins for that chunk.
    filename_rules: Vec<Regex>,
    percent: f32,
    filename: Option<String>,
}

impl ProgressParser {
    pub fn new() -> Self {
        let filename_rules = [
            r"\[download\] Destination: (.+)",
            r"\[download\] (.+) has already been downloaded",
            r"\[ExtractAudio\] Destination: (.+)",
            r#"\[Merger\] Merging formats into "(.+)""#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("filename pattern is valid"))
        .collect();

        Self {
            percent_re: Regex::new(r"(\d+\.?\d*)%").expect("percent pattern is valid"),
            filename_rules,
            percent: 0.0,
            filename: None,
        }
    }

    /// Consumes one output chunk. Returns true if the snapshot changed.
    pub fn feed(&mut self, chunk: &str) -> bool {
        let mut changed = false;

        if let Some(caps) = self.percent_re.captures(chunk) {
            if let Ok(percent) = caps[1].parse::<f32>() {
                if percent != self.percent {
                    self.percent = percent;
                    changed = true;
                }
            }
        }

        for rule in &self.filename_rules {
            if let Some(caps) = rule.captures(chunk) {
                let path = caps[1].trim();
                let name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string());
                if self.filename.as_deref() != Some(name.as_str()) {
                    self.filename = Some(name);
                    changed = true;
                }
                break;
            }
        }

        changed
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            percent: self.percent,
            filename: self.filename.clone(),
        }
    }
}

impl Default for ProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_extraction() {
        let mut parser = ProgressParser::new();
        assert!(parser.feed(
            "[download]  42.3% of 120.45MiB at 5.23MiB/s ETA 00:13"
        ));
        assert_eq!(parser.percent(), 42.3);
    }

    #[test]
    fn test_percent_integer() {
        let mut parser = ProgressParser::new();
        parser.feed("[download] 100% of 120.45MiB in 00:23");
        assert_eq!(parser.percent(), 100.0);
    }

    #[test]
    fn test_percent_regression_is_tolerated() {
        // The tool restarts reporting after a format-fallback retry
        let mut parser = ProgressParser::new();
        parser.feed("[download]  87.1% of 120MiB");
        parser.feed("[download]  12.0% of 98MiB");
        assert_eq!(parser.percent(), 12.0);
    }

    #[test]
    fn test_destination_line() {
        let mut parser = ProgressParser::new();
        assert!(parser.feed("[download] Destination: /tmp/clipfetch/abc_movie.mp4"));
        assert_eq!(parser.filename(), Some("abc_movie.mp4"));
    }

    #[test]
    fn test_already_downloaded_line() {
        let mut parser = ProgressParser::new();
        parser.feed("[download] /tmp/clipfetch/abc_movie.mp4 has already been downloaded");
        assert_eq!(parser.filename(), Some("abc_movie.mp4"));
    }

    #[test]
    fn test_extract_audio_line() {
        let mut parser = ProgressParser::new();
        parser.feed("[ExtractAudio] Destination: /tmp/clipfetch/abc_song.mp3");
        assert_eq!(parser.filename(), Some("abc_song.mp3"));
    }

    #[test]
    fn test_merger_line() {
        let mut parser = ProgressParser::new();
        parser.feed(r#"[Merger] Merging formats into "/tmp/clipfetch/abc_movie.mkv""#);
        assert_eq!(parser.filename(), Some("abc_movie.mkv"));
    }

    #[test]
    fn test_first_rule_wins_within_chunk() {
        let mut parser = ProgressParser::new();
        parser.feed(concat!(
            "[download] Destination: /tmp/abc_video.f137.mp4\n",
            "[ExtractAudio] Destination: /tmp/abc_audio.m4a"
        ));
        assert_eq!(parser.filename(), Some("abc_video.f137.mp4"));
    }

    #[test]
    fn test_later_chunk_overwrites_filename() {
        // The merger announces the final artifact after per-stream downloads
        let mut parser = ProgressParser::new();
        parser.feed("[download] Destination: /tmp/abc_video.f137.mp4");
        parser.feed(r#"[Merger] Merging formats into "/tmp/abc_video.mp4""#);
        assert_eq!(parser.filename(), Some("abc_video.mp4"));
    }

    #[test]
    fn test_unchanged_chunk_reports_no_change() {
        let mut parser = ProgressParser::new();
        assert!(!parser.feed("[youtube] xyz: Downloading webpage"));
        parser.feed("[download]  42.3% of 120MiB");
        assert!(!parser.feed("[download]  42.3% of 120MiB"));
    }

    #[test]
    fn test_realistic_transcript() {
        let transcript = [
            "[youtube] Extracting URL: https://youtu.be/xyz",
            "[youtube] xyz: Downloading webpage",
            "[info] xyz: Downloading 1 format(s): 137+140",
            "[download] Destination: /tmp/clipfetch/abc_My Video.f137.mp4",
            "[download]   0.1% of  120.45MiB at    1.02MiB/s ETA 01:57",
            "[download]  55.0% of  120.45MiB at    5.23MiB/s ETA 00:10",
            "[download] 100% of  120.45MiB in 00:23",
            "[download] Destination: /tmp/clipfetch/abc_My Video.f140.m4a",
            "[download] 100% of    3.50MiB in 00:01",
            r#"[Merger] Merging formats into "/tmp/clipfetch/abc_My Video.mp4""#,
        ];

        let mut parser = ProgressParser::new();
        for line in transcript {
            parser.feed(line);
        }
        let snapshot = parser.snapshot();
        assert_eq!(snapshot.percent, 100.0);
        assert_eq!(snapshot.filename.as_deref(), Some("abc_My Video.mp4"));
    }
}
