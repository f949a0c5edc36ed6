//! Process execution for launch strategies.
//!
//! Spawned slicers are detached: they are never killed when the handle is
//! dropped. Whether a spawn "worked" is judged by a grace period; a process
//! that already exited when it ends is reported as failed together with
//! whatever it wrote to stdout/stderr.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use curabridge_core::config::launch::LaunchConfig;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::strategy::AttemptOutcome;

/// Maximum characters of captured output kept in logs and reasons.
const MAX_CAPTURED_CHARS: usize = 2000;

/// Runs strategy invocations.
#[derive(Debug, Clone)]
pub struct LaunchExecutor {
    /// How long a spawned process must stay alive.
    grace_period: Duration,
    /// Directory for captured output; `None` discards output.
    log_dir: Option<PathBuf>,
}

impl LaunchExecutor {
    /// Create an executor from launch settings.
    pub fn new(config: &LaunchConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            log_dir: config
                .capture_output
                .then(|| config.effective_log_dir()),
        }
    }

    /// The grace period in use.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Spawn `program` and decide success after the grace period.
    pub async fn spawn_watched(
        &self,
        label: &str,
        program: &Path,
        args: &[OsString],
    ) -> AttemptOutcome {
        info!(
            strategy = label,
            program = %program.display(),
            args = ?args,
            "Launching slicer"
        );

        let capture = self.open_capture(label);
        let (stdout, stderr) = match &capture {
            Some(c) => (c.stdout_stdio(), c.stderr_stdio()),
            None => (Stdio::null(), Stdio::null()),
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(false);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(strategy = label, error = %e, "Failed to spawn slicer");
                return AttemptOutcome::Failed {
                    reason: format!("spawn failed: {e}"),
                };
            }
        };

        let pid = child.id();
        tokio::time::sleep(self.grace_period).await;

        match child.try_wait() {
            Ok(None) => {
                info!(strategy = label, pid = ?pid, "Slicer is running");
                AttemptOutcome::Launched { pid }
            }
            Ok(Some(status)) => {
                let (out, err) = capture
                    .as_ref()
                    .map(Capture::read)
                    .unwrap_or_default();
                warn!(
                    strategy = label,
                    status = %status,
                    stdout = %out,
                    stderr = %err,
                    "Slicer exited within the grace period"
                );
                let mut reason = format!("exited early ({status})");
                if !err.trim().is_empty() {
                    reason.push_str(": ");
                    reason.push_str(err.trim());
                }
                AttemptOutcome::Failed { reason }
            }
            Err(e) => {
                warn!(strategy = label, error = %e, "Cannot query slicer process state");
                AttemptOutcome::Failed {
                    reason: format!("cannot query process state: {e}"),
                }
            }
        }
    }

    /// Run an OS open call; success means the call itself succeeded.
    pub async fn run_os_call(&self, label: &str, program: &Path, args: &[OsString]) -> AttemptOutcome {
        info!(
            strategy = label,
            program = %program.display(),
            args = ?args,
            "Asking the OS to open the file"
        );

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => AttemptOutcome::Launched { pid: None },
            Ok(output) => {
                let stderr: String = String::from_utf8_lossy(&output.stderr)
                    .chars()
                    .take(MAX_CAPTURED_CHARS)
                    .collect();
                warn!(
                    strategy = label,
                    status = %output.status,
                    stderr = %stderr,
                    "OS open call failed"
                );
                AttemptOutcome::Failed {
                    reason: format!("{} ({})", stderr.trim(), output.status),
                }
            }
            Err(e) => {
                warn!(strategy = label, error = %e, "OS open call could not run");
                AttemptOutcome::Failed {
                    reason: format!("os call failed: {e}"),
                }
            }
        }
    }

    /// Open `file` with its registered handler (ShellExecute on Windows).
    ///
    /// No shell parses the path, so `&`, `%` and quotes in file names are
    /// passed through unchanged.
    pub async fn shell_open(&self, label: &str, file: &Path) -> AttemptOutcome {
        info!(
            strategy = label,
            file = %file.display(),
            "Opening the file with its default handler"
        );

        let target = file.to_path_buf();
        match tokio::task::spawn_blocking(move || opener::open(&target)).await {
            Ok(Ok(())) => AttemptOutcome::Launched { pid: None },
            Ok(Err(e)) => {
                warn!(strategy = label, error = %e, "Default handler failed");
                AttemptOutcome::Failed {
                    reason: format!("default handler failed: {e}"),
                }
            }
            Err(e) => {
                warn!(strategy = label, error = %e, "Default handler task failed");
                AttemptOutcome::Failed {
                    reason: format!("default handler task failed: {e}"),
                }
            }
        }
    }

    fn open_capture(&self, label: &str) -> Option<Capture> {
        let dir = self.log_dir.as_ref()?;
        match Capture::create(dir, label) {
            Ok(capture) => Some(capture),
            Err(e) => {
                debug!(
                    dir = %dir.display(),
                    error = %e,
                    "Cannot create output capture files, discarding output"
                );
                None
            }
        }
    }
}

/// Files receiving a spawned process's stdout and stderr.
///
/// Files rather than pipes, so a slicer that keeps running never blocks on
/// a pipe nobody reads.
#[derive(Debug)]
struct Capture {
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    stdout: File,
    stderr: File,
}

impl Capture {
    fn create(dir: &Path, label: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let stdout_path = dir.join(format!("{label}.stdout.log"));
        let stderr_path = dir.join(format!("{label}.stderr.log"));
        Ok(Self {
            stdout: File::create(&stdout_path)?,
            stderr: File::create(&stderr_path)?,
            stdout_path,
            stderr_path,
        })
    }

    fn stdout_stdio(&self) -> Stdio {
        self.stdout
            .try_clone()
            .map(Stdio::from)
            .unwrap_or_else(|_| Stdio::null())
    }

    fn stderr_stdio(&self) -> Stdio {
        self.stderr
            .try_clone()
            .map(Stdio::from)
            .unwrap_or_else(|_| Stdio::null())
    }

    fn read(&self) -> (String, String) {
        (read_truncated(&self.stdout_path), read_truncated(&self.stderr_path))
    }
}

fn read_truncated(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| {
            String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_CAPTURED_CHARS)
                .collect()
        })
        .unwrap_or_default()
}
