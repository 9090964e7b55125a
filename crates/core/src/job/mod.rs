//! Download job lifecycle.
//!
//! A job is created per submission, driven by its own task, and publishes
//! progress snapshots plus exactly one terminal event before its stream
//! closes.

mod runner;
mod types;

pub use runner::{JobRunner, HEARTBEAT_INTERVAL};
pub use types::{CompletedPayload, FailedPayload, Job, JobEvent, ProgressPayload};
