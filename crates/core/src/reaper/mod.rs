//! Temp file deletion: post-retrieval grace reaper and age-based sweep.
//!
//! Both paths tolerate deletion races as no-ops; the store's `remove` is
//! idempotent, so the sweep and a grace timer targeting the same file never
//! error.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::metrics::{FILES_REAPED, FILES_SWEPT};
use crate::store::TempStore;

/// Owns delayed and periodic deletion of store entries.
#[derive(Debug, Clone)]
pub struct Reaper {
    store: TempStore,
}

impl Reaper {
    pub fn new(store: TempStore) -> Self {
        Self { store }
    }

    /// Schedules deletion of a job's output and sidecar after the grace
    /// window. Returns the timer task so callers can cancel or await it.
    pub fn schedule_grace_delete(&self, job_id: &str, grace: Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        let job_id = job_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            match store.remove_job_files(&job_id).await {
                Ok(0) => debug!("Grace delete for {}: nothing left to remove", job_id),
                Ok(n) => {
                    FILES_REAPED.inc_by(n as u64);
                    info!("Grace delete for {}: removed {} file(s)", job_id, n);
                }
                // The response already completed, never surface this
                Err(e) => error!("Grace delete for {} failed: {}", job_id, e),
            }
        })
    }

    /// Deletes every entry older than `retention`. Returns the count.
    pub async fn run_sweep(&self, retention: Duration) -> usize {
        match self.store.sweep(retention).await {
            Ok(n) => {
                if n > 0 {
                    FILES_SWEPT.inc_by(n as u64);
                    info!("Sweep removed {} stale temp file(s)", n);
                }
                n
            }
            Err(e) => {
                error!("Sweep failed: {}", e);
                0
            }
        }
    }

    /// Runs a sweep immediately, then repeats on the given interval.
    pub fn spawn_sweeper(&self, retention: Duration, interval: Duration) -> JoinHandle<()> {
        let reaper = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                reaper.run_sweep(retention).await;
            }
        })
    }
}
