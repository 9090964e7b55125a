pub mod config;
pub mod extractor;
pub mod job;
pub mod media;
pub mod metrics;
pub mod progress;
pub mod reaper;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ExtractorConfig,
    RetentionConfig, SanitizedConfig, ServerConfig,
};
pub use extractor::{
    build_args, output_template, ExtractorError, Supervisor, VariantFormat, VariantInspector,
    VariantSelector, VideoInfo, YtDlpInspector,
};
pub use job::{Job, JobEvent, JobRunner, HEARTBEAT_INTERVAL};
pub use media::content_type_for;
pub use progress::{ProgressParser, ProgressSnapshot};
pub use reaper::Reaper;
pub use store::{StoreEntry, StoreError, TempStore, SIDECAR_SUFFIX};
