//! Prometheus metrics for core components.

use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Jobs accepted and spawned.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("clipfetch_jobs_started_total", "Total download jobs started").unwrap()
});

/// Terminal job outcomes by result.
pub static JOBS_TERMINAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipfetch_jobs_terminal_total",
            "Total jobs reaching a terminal state",
        ),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Files deleted by the age-based sweep.
pub static FILES_SWEPT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_files_swept_total",
        "Temp files deleted by the retention sweep",
    )
    .unwrap()
});

/// Files deleted by the post-retrieval grace reaper.
pub static FILES_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_files_reaped_total",
        "Temp files deleted after the retrieval grace window",
    )
    .unwrap()
});

/// All core metrics, for registration by the server's registry.
pub fn all_metrics() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_TERMINAL.clone()),
        Box::new(FILES_SWEPT.clone()),
        Box::new(FILES_REAPED.clone()),
    ]
}
