//! Job runner: bridges the process supervisor and progress parser to a
//! single client-facing event stream.
//!
//! One task per job owns all mutable job state (parser, stderr buffer) and
//! is the only writer to the event channel, so a heartbeat can never race a
//! terminal event and nothing is ever written after the terminal event.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info, warn};

use crate::extractor::{build_args, output_template, RunningProcess, Supervisor};
use crate::metrics::{JOBS_STARTED, JOBS_TERMINAL};
use crate::progress::ProgressParser;
use crate::store::TempStore;

use super::types::{Job, JobEvent};

/// How often the latest progress snapshot is published while the process is
/// alive, whether or not new output arrived.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Event channel capacity per job.
const EVENT_CHANNEL_CAPACITY: usize = 64;

const CONVERSION_HINT: &str = "\n\nFormat conversion failed. Please try:\n\
    1. Using MP4 format (most compatible)\n\
    2. Selecting a different video quality\n\
    3. Trying without audio if video-only download works";

const FFMPEG_HINT: &str =
    "\n\nFFmpeg processing error. MP4 format is recommended for best compatibility.";

/// Runs download jobs, one concurrent task per job.
#[derive(Debug, Clone)]
pub struct JobRunner {
    supervisor: Supervisor,
    store: TempStore,
    heartbeat: Duration,
}

impl JobRunner {
    pub fn new(supervisor: Supervisor, store: TempStore) -> Self {
        Self {
            supervisor,
            store,
            heartbeat: HEARTBEAT_INTERVAL,
        }
    }

    /// Overrides the heartbeat interval (tests use short intervals).
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Spawns the extraction process for a job and returns its event stream.
    ///
    /// The stream yields any number of progress snapshots followed by
    /// exactly one terminal event, after which it closes. A launch failure
    /// still produces a stream, carrying only the terminal error.
    pub fn run(&self, job: Job) -> mpsc::Receiver<JobEvent> {
        self.run_with_slot(job, None)
    }

    /// Like [`run`](Self::run), but the job task holds the concurrency slot
    /// until it reaches a terminal state. The slot must outlive the process,
    /// not the client stream: a disconnected client does not kill the job,
    /// so releasing on stream drop would let live processes exceed the cap.
    pub fn run_with_slot(
        &self,
        job: Job,
        slot: Option<OwnedSemaphorePermit>,
    ) -> mpsc::Receiver<JobEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        JOBS_STARTED.inc();

        let template = output_template(self.store.root(), &job.id);
        let args = build_args(&job.selector, &template, &job.url);

        match self.supervisor.spawn(&args) {
            Ok(process) => {
                let store = self.store.clone();
                let heartbeat = self.heartbeat;
                tokio::spawn(async move {
                    drive_job(job, process, store, heartbeat, tx, slot).await;
                });
            }
            Err(e) => {
                warn!("Failed to launch extraction process for {}: {}", job.id, e);
                JOBS_TERMINAL.with_label_values(&["failed"]).inc();
                let event = JobEvent::failed(e.to_string());
                tokio::spawn(async move {
                    let _ = tx.send(event).await;
                });
            }
        }

        rx
    }
}

/// Drives one job to its terminal state. Sole writer to `tx`. The slot, if
/// any, is released when this task returns, never earlier.
async fn drive_job(
    job: Job,
    mut process: RunningProcess,
    store: TempStore,
    heartbeat: Duration,
    tx: mpsc::Sender<JobEvent>,
    _slot: Option<OwnedSemaphorePermit>,
) {
    let mut parser = ProgressParser::new();
    let mut stderr_buf = String::new();
    let mut client_gone = false;

    let mut ticker = tokio::time::interval(heartbeat);
    // First tick fires immediately; clients get an initial snapshot at once
    let exit_status = loop {
        tokio::select! {
            Some(line) = process.stdout.recv() => {
                debug!("[{}] stdout: {}", job.id, line);
                parser.feed(&line);
            }
            Some(line) = process.stderr.recv() => {
                debug!("[{}] stderr: {}", job.id, line);
                stderr_buf.push_str(&line);
                stderr_buf.push('\n');
            }
            _ = ticker.tick() => {
                if client_gone {
                    continue;
                }
                let snapshot = parser.snapshot();
                let event = JobEvent::progress(
                    &job.id,
                    snapshot.percent,
                    snapshot.filename.as_deref(),
                );
                // Never block on a slow reader here: a full channel would
                // stop the output drain and stall the child on a full pipe.
                // Stale snapshots are droppable; the terminal event is not
                // and keeps its blocking send below.
                match tx.try_send(event) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Closed(_)) => {
                        // Client disconnected; keep driving the process so a
                        // later retrieval by id can still succeed
                        debug!("[{}] client gone, continuing without publishing", job.id);
                        client_gone = true;
                    }
                }
            }
            status = &mut process.exit => {
                break status;
            }
        }
    };

    // The exit notification fires after both pipes hit EOF, but buffered
    // lines may still sit in the channels
    while let Ok(line) = process.stdout.try_recv() {
        parser.feed(&line);
    }
    while let Ok(line) = process.stderr.try_recv() {
        stderr_buf.push_str(&line);
        stderr_buf.push('\n');
    }

    let terminal = match exit_status {
        Ok(Ok(status)) if status.success() => {
            finish_successful_exit(&job, &parser, &store).await
        }
        Ok(Ok(status)) => {
            info!("[{}] process failed with {:?}", job.id, status.code());
            JobEvent::failed(failure_message(status, &stderr_buf))
        }
        Ok(Err(e)) => {
            warn!("[{}] process wait error: {}", job.id, e);
            JobEvent::failed(e.to_string())
        }
        Err(_) => {
            warn!("[{}] supervisor dropped exit channel", job.id);
            JobEvent::failed("extraction process lost")
        }
    };

    let result = if matches!(terminal, JobEvent::Completed(_)) {
        "completed"
    } else {
        "failed"
    };
    JOBS_TERMINAL.with_label_values(&[result]).inc();
    info!("[{}] job {}", job.id, result);

    let _ = tx.send(terminal).await;
    // tx drops here, closing the stream; nothing can be written after the
    // terminal event
}

/// A zero exit code is not proof of success: the output file must exist.
/// Prefers the parser-resolved filename, falling back to a store scan by
/// job-id prefix.
async fn finish_successful_exit(job: &Job, parser: &ProgressParser, store: &TempStore) -> JobEvent {
    let named = match parser.filename() {
        Some(name) => store.stat(name).await.ok(),
        None => None,
    };

    let entry = match named {
        Some(entry) => Some(entry),
        None => store.find_output(&job.id).await.unwrap_or_else(|e| {
            warn!("[{}] store scan failed: {}", job.id, e);
            None
        }),
    };

    match entry {
        Some(entry) => JobEvent::completed(&job.id, &entry.name, entry.size_bytes),
        None => {
            warn!("[{}] exit 0 but no output file found", job.id);
            JobEvent::failed("output file not found")
        }
    }
}

/// Builds the failure message from accumulated stderr, appending targeted
/// guidance for known conversion/merge tool failures.
fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let mut message = if stderr.is_empty() {
        format!("Download failed (exit code {:?})", status.code())
    } else {
        stderr.to_string()
    };

    if stderr.contains("Conversion failed") || stderr.contains("Postprocessing") {
        message.push_str(CONVERSION_HINT);
    }
    if stderr.contains("ffmpeg") || stderr.contains("avconv") {
        message.push_str(FFMPEG_HINT);
    }

    message
}
