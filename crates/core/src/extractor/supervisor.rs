//! Spawns one extraction process per job and exposes its output streams.
//!
//! Stdout and stderr are drained by independent tasks so a full pipe buffer
//! can never deadlock the child. The exit notification fires only after both
//! pipes reach EOF and the process has been reaped.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::error::ExtractorError;

/// Buffer size for output line channels.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// A spawned extraction process with its output streams.
pub struct RunningProcess {
    /// Stdout, one text line per message.
    pub stdout: mpsc::Receiver<String>,
    /// Stderr, one text line per message.
    pub stderr: mpsc::Receiver<String>,
    /// Fires once with the exit status after the process is reaped.
    pub exit: oneshot::Receiver<std::io::Result<ExitStatus>>,
}

/// Launches extraction processes for download jobs.
#[derive(Debug, Clone)]
pub struct Supervisor {
    program: PathBuf,
}

impl Supervisor {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Spawns the extraction tool with the given arguments.
    ///
    /// A missing executable is reported as `ExecutableNotFound`; everything
    /// after a successful spawn is reported through the handle's channels.
    pub fn spawn(&self, args: &[String]) -> Result<RunningProcess, ExtractorError> {
        debug!("Spawning {:?} with args: {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::ExecutableNotFound {
                        path: self.program.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        let stdout = child.stdout.take().expect("stdout should be piped");
        let stderr = child.stderr.take().expect("stderr should be piped");

        let (stdout_tx, stdout_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let (stderr_tx, stderr_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let (exit_tx, exit_rx) = oneshot::channel();

        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                // Receiver gone means the job no longer cares, keep
                // draining so the child is never blocked on a full pipe
                let _ = stdout_tx.send(line).await;
            }
        });

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = stderr_tx.send(line).await;
            }
        });

        tokio::spawn(async move {
            let status = child.wait().await;
            // Both pipes must be at EOF before the terminal notification,
            // otherwise trailing output lines could race it
            let _ = stdout_task.await;
            let _ = stderr_task.await;
            let _ = exit_tx.send(status);
        });

        Ok(RunningProcess {
            stdout: stdout_rx,
            stderr: stderr_rx,
            exit: exit_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_executable() {
        let supervisor = Supervisor::new(PathBuf::from("/nonexistent/yt-dlp"));
        let result = supervisor.spawn(&["--version".to_string()]);
        assert!(matches!(
            result,
            Err(ExtractorError::ExecutableNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_captures_stdout_and_exit() {
        let supervisor = Supervisor::new(PathBuf::from("/bin/sh"));
        let mut process = supervisor
            .spawn(&[
                "-c".to_string(),
                "echo line-one; echo line-two".to_string(),
            ])
            .unwrap();

        let mut lines = Vec::new();
        while let Some(line) = process.stdout.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["line-one", "line-two"]);

        let status = process.exit.await.unwrap().unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_spawn_captures_stderr_and_failure() {
        let supervisor = Supervisor::new(PathBuf::from("/bin/sh"));
        let mut process = supervisor
            .spawn(&["-c".to_string(), "echo oops >&2; exit 3".to_string()])
            .unwrap();

        let mut lines = Vec::new();
        while let Some(line) = process.stderr.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["oops"]);

        let status = process.exit.await.unwrap().unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
