//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when driving the external extraction tool.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// One-shot metadata inspection failed.
    #[error("Variant inspection failed: {reason}")]
    InspectFailed { reason: String },

    /// Failed to parse the tool's JSON metadata output.
    #[error("Failed to parse extractor output: {reason}")]
    ParseError { reason: String },

    /// I/O error while spawning or talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    pub fn inspect_failed(reason: impl Into<String>) -> Self {
        Self::InspectFailed {
            reason: reason.into(),
        }
    }

    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}
