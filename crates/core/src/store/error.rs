//! Error types for the temp file store.

use thiserror::Error;

/// Errors that can occur in the temp file store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A requested filename would resolve outside the store root.
    #[error("Path escapes store root: {filename}")]
    PathEscape { filename: String },

    /// A requested entry does not exist.
    #[error("File not found in store: {filename}")]
    NotFound { filename: String },

    /// I/O error while operating on the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error should be reported to a client as a security
    /// rejection rather than a server fault.
    pub fn is_path_security(&self) -> bool {
        matches!(self, Self::PathEscape { .. })
    }
}
