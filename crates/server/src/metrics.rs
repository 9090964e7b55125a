//! Prometheus metrics for the HTTP layer.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Files successfully served to clients.
pub static FILES_SERVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipfetch_files_served_total",
        "Completed file retrieval responses",
    )
    .unwrap()
});

/// Jobs currently holding a concurrency slot.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("clipfetch_jobs_active", "Jobs currently running").unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(FILES_SERVED.clone())).unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();

    for metric in clipfetch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
