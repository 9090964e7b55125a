use std::sync::Arc;
use std::time::Duration;

use regex_lite::Regex;
use tokio::sync::{Semaphore, TryAcquireError};

use clipfetch_core::{
    Config, JobRunner, Reaper, SanitizedConfig, Supervisor, TempStore, VariantInspector,
    YtDlpInspector,
};

/// Allow-pattern for the supported video platform.
const URL_ALLOW_PATTERN: &str = r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+";

/// Shared application state
pub struct AppState {
    config: Config,
    store: TempStore,
    runner: JobRunner,
    reaper: Reaper,
    inspector: Arc<dyn VariantInspector>,
    job_slots: Arc<Semaphore>,
    url_pattern: Regex,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = TempStore::new(config.extractor.temp_dir.clone());
        let supervisor = Supervisor::new(config.extractor.yt_dlp_path.clone());
        let runner = JobRunner::new(supervisor, store.clone());
        let reaper = Reaper::new(store.clone());
        let inspector = Arc::new(YtDlpInspector::new(config.extractor.yt_dlp_path.clone()));
        Self::with_parts(config, store, runner, reaper, inspector)
    }

    /// Assembles state from explicit parts; tests inject fakes here.
    pub fn with_parts(
        config: Config,
        store: TempStore,
        runner: JobRunner,
        reaper: Reaper,
        inspector: Arc<dyn VariantInspector>,
    ) -> Self {
        let job_slots = Arc::new(Semaphore::new(config.extractor.max_concurrent_jobs));
        Self {
            config,
            store,
            runner,
            reaper,
            inspector,
            job_slots,
            url_pattern: Regex::new(URL_ALLOW_PATTERN).expect("url pattern is valid"),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &TempStore {
        &self.store
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn reaper(&self) -> &Reaper {
        &self.reaper
    }

    pub fn inspector(&self) -> &dyn VariantInspector {
        self.inspector.as_ref()
    }

    pub fn is_allowed_url(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
    }

    pub fn grace_delete_delay(&self) -> Duration {
        Duration::from_secs(self.config.retention.grace_delete_secs)
    }

    /// Tries to claim a job slot under the concurrency cap.
    pub fn try_acquire_job_slot(
        &self,
    ) -> Result<tokio::sync::OwnedSemaphorePermit, TryAcquireError> {
        Arc::clone(&self.job_slots).try_acquire_owned()
    }

    /// Jobs currently holding a slot.
    pub fn active_jobs(&self) -> usize {
        self.config.extractor.max_concurrent_jobs - self.job_slots.available_permits()
    }
}
