use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clipclock_core::error::AppError;
use clipclock_core::traits::{CommandOutput, CommandRunner, TIMEOUT_EXIT_CODE};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to keep draining pipes once the process itself is gone.
const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(2);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Command runner backed by `tokio::process`.
///
/// Both output streams are read concurrently while waiting, so a chatty
/// process cannot block on a full pipe. At the deadline the child is killed
/// and the run reports [`TIMEOUT_EXIT_CODE`].
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    drain_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// How long to keep reading output after the process has exited.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Whether `program --version` runs and exits cleanly.
    pub async fn probe(&self, program: &Path) -> bool {
        match self.run(program, &["--version"], PROBE_TIMEOUT).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!(error = %e, "Tool probe failed");
                false
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, AppError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::SpawnError {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;

        let stdout = PipeReader::spawn(child.stdout.take());
        let stderr = PipeReader::spawn(child.stderr.take());

        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (exit_code(status), false),
            Ok(Err(e)) => {
                tracing::warn!(program = %program.display(), error = %e, "Failed to wait on child process");
                (-1, false)
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(program = %program.display(), error = %e, "Failed to kill timed-out process");
                }
                tracing::warn!(
                    program = %program.display(),
                    timeout_secs = timeout.as_secs(),
                    "Process killed at deadline"
                );
                (TIMEOUT_EXIT_CODE, true)
            }
        };

        let (stdout, stderr) = tokio::join!(
            stdout.finish(self.drain_grace),
            stderr.finish(self.drain_grace)
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            timed_out,
        })
    }
}

/// Background reader copying one pipe into a shared buffer as bytes arrive.
struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl PipeReader {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        sink.lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]);
                    }
                }
            }
        });
        Self { buffer, handle }
    }

    /// Trimmed text read so far, waiting at most `grace` for end of stream.
    ///
    /// A grandchild that inherited the pipe can hold it open after the direct
    /// child exits. The reader is then stopped and the partial output kept.
    async fn finish(mut self, grace: Duration) -> String {
        if tokio::time::timeout(grace, &mut self.handle).await.is_err() {
            self.handle.abort();
            tracing::debug!(
                grace_ms = grace.as_millis() as u64,
                "Pipe still open after process exit; keeping partial output"
            );
        }
        let bytes = self
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).trim().to_string()
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
