//! External extraction tool integration.
//!
//! The tool (yt-dlp) is treated as an opaque executable: this module builds
//! its argument lists, spawns it, and exposes its output streams. Parsing of
//! that output lives in [`crate::progress`]; job lifecycle in [`crate::job`].

mod args;
mod error;
mod inspect;
mod supervisor;

pub use args::{build_args, output_template, VariantSelector};
pub use error::ExtractorError;
pub use inspect::{
    parse_video_info, VariantFormat, VariantGroups, VariantInspector, VideoInfo, YtDlpInspector,
};
pub use supervisor::{RunningProcess, Supervisor};
