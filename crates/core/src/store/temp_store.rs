//! Directory-scoped store for in-flight and recently completed downloads.
//!
//! Every artifact written by an extraction job is named with the owning job's
//! identifier as a prefix, so lookup, retrieval validation and deletion all
//! work by prefix without any bookkeeping outside the filesystem.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::error::StoreError;

/// Suffix of the sidecar metadata file yt-dlp writes next to each download.
pub const SIDECAR_SUFFIX: &str = ".info.json";

/// A single entry in the store.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Bare filename (no directory components).
    pub name: String,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

impl StoreEntry {
    /// Whether this entry is a sidecar metadata file rather than an output.
    pub fn is_sidecar(&self) -> bool {
        self.name.ends_with(SIDECAR_SUFFIX)
    }
}

/// Temp file store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it does not exist.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Resolves a bare filename to a path inside the root.
    ///
    /// Rejects anything that is not a single normal path component, so
    /// traversal segments and absolute paths never reach the filesystem.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(StoreError::PathEscape {
                    filename: filename.to_string(),
                })
            }
        }

        let path = self.root.join(filename);
        if !path.starts_with(&self.root) {
            return Err(StoreError::PathEscape {
                filename: filename.to_string(),
            });
        }
        Ok(path)
    }

    /// Lists all entries in the store.
    pub async fn list(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Entry disappeared between readdir and stat, skip it
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            entries.push(StoreEntry {
                name,
                size_bytes: meta.len(),
                modified: meta.modified()?,
            });
        }
        Ok(entries)
    }

    /// Stats a single entry by filename.
    pub async fn stat(&self, filename: &str) -> Result<StoreEntry, StoreError> {
        let path = self.resolve(filename)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    filename: filename.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(StoreEntry {
            name: filename.to_string(),
            size_bytes: meta.len(),
            modified: meta.modified()?,
        })
    }

    /// Removes a single entry. Removing a nonexistent entry is not an error,
    /// so concurrent deletion races resolve as no-ops.
    pub async fn remove(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Finds the output file for a job: the first entry whose name is
    /// prefixed by the job identifier and is not a sidecar.
    pub async fn find_output(&self, job_id: &str) -> Result<Option<StoreEntry>, StoreError> {
        let entries = self.list().await?;
        Ok(entries
            .into_iter()
            .find(|e| e.name.starts_with(job_id) && !e.is_sidecar()))
    }

    /// Removes every file belonging to a job, sidecar included.
    pub async fn remove_job_files(&self, job_id: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for entry in self.list().await? {
            if !entry.name.starts_with(job_id) {
                continue;
            }
            match self.remove(&entry.name).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", entry.name, e),
            }
        }
        Ok(removed)
    }

    /// Deletes every entry older than `max_age`, regardless of job status.
    /// Returns the number of files removed.
    pub async fn sweep(&self, max_age: Duration) -> Result<usize, StoreError> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in self.list().await? {
            let age = match now.duration_since(entry.modified) {
                Ok(age) => age,
                // Future mtime, leave it alone
                Err(_) => continue,
            };
            if age < max_age {
                continue;
            }
            match self.remove(&entry.name).await {
                Ok(()) => {
                    debug!("Swept stale temp file: {}", entry.name);
                    removed += 1;
                }
                Err(e) => warn!("Failed to sweep {}: {}", entry.name, e),
            }
        }

        Ok(removed)
    }
}
