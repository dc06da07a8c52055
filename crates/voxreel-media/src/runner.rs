//! Subprocess runner with deadline, cancellation and stdio capture.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::CommandDescriptor;
use crate::error::{MediaResult, RunError, RunErrorKind};

/// How long to keep draining stdio after the process is gone. A grandchild
/// that inherited the pipes can keep them open past the kill.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

const COMMAND_DURATION_SECONDS: &str = "voxreel_command_duration_seconds";
const COMMAND_FAILURES_TOTAL: &str = "voxreel_command_failures_total";

type SharedBuf = Arc<Mutex<Vec<u8>>>;

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

/// Runner for command descriptors.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    /// Fixed timeout applied to every run
    timeout: Option<Duration>,
    /// Cancellation signal
    cancel: Option<CancellationToken>,
}

impl CommandRunner {
    /// Create a runner with no timeout and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a command to completion, capturing stdout and stderr separately.
    pub async fn run(&self, cmd: &CommandDescriptor) -> MediaResult<()> {
        let command_line = cmd.command_line();
        debug!(command = %command_line, "Running command");
        let started = Instant::now();

        let mut child = match Command::new(cmd.binary())
            .args(cmd.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                counter!(COMMAND_FAILURES_TOTAL, "binary" => cmd.binary().to_string()).increment(1);
                return Err(RunError {
                    command: command_line,
                    kind: RunErrorKind::Spawn(e),
                    stdout: String::new(),
                    stderr: String::new(),
                }
                .into());
            }
        };

        let stdout_buf = SharedBuf::default();
        let stderr_buf = SharedBuf::default();
        let stdout_reader = spawn_reader(child.stdout.take(), Arc::clone(&stdout_buf));
        let stderr_reader = spawn_reader(child.stderr.take(), Arc::clone(&stderr_buf));

        let deadline = async {
            match self.timeout {
                Some(timeout) => {
                    tokio::time::sleep(timeout).await;
                    timeout
                }
                None => std::future::pending().await,
            }
        };
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            timeout = deadline => WaitOutcome::TimedOut(timeout),
            _ = cancelled => WaitOutcome::Cancelled,
        };

        let kind = match outcome {
            WaitOutcome::Exited(Ok(status)) if status.success() => None,
            WaitOutcome::Exited(Ok(status)) => Some(RunErrorKind::Exited(status.code())),
            WaitOutcome::Exited(Err(e)) => Some(RunErrorKind::Wait(e)),
            WaitOutcome::TimedOut(timeout) => {
                warn!(
                    command = %command_line,
                    "Command timed out after {:?}, killing process", timeout
                );
                let _ = child.kill().await;
                Some(RunErrorKind::DeadlineExceeded(timeout))
            }
            WaitOutcome::Cancelled => {
                info!(command = %command_line, "Command cancelled, killing process");
                let _ = child.kill().await;
                Some(RunErrorKind::Cancelled)
            }
        };

        drain(stdout_reader).await;
        drain(stderr_reader).await;

        histogram!(COMMAND_DURATION_SECONDS, "binary" => cmd.binary().to_string())
            .record(started.elapsed().as_secs_f64());

        match kind {
            None => {
                debug!(
                    command = %command_line,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Command finished"
                );
                Ok(())
            }
            Some(kind) => {
                counter!(COMMAND_FAILURES_TOTAL, "binary" => cmd.binary().to_string()).increment(1);
                Err(RunError {
                    command: command_line,
                    kind,
                    stdout: take_string(&stdout_buf),
                    stderr: take_string(&stderr_buf),
                }
                .into())
            }
        }
    }
}

fn spawn_reader<R>(stream: Option<R>, buf: SharedBuf) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut stream) = stream else {
            return;
        };
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut buf) = buf.lock() {
                        buf.extend_from_slice(&chunk[..n]);
                    }
                }
            }
        }
    })
}

async fn drain(mut reader: JoinHandle<()>) {
    if tokio::time::timeout(DRAIN_GRACE, &mut reader).await.is_err() {
        reader.abort();
    }
}

fn take_string(buf: &SharedBuf) -> String {
    match buf.lock() {
        Ok(mut buf) => String::from_utf8_lossy(&std::mem::take(&mut *buf)).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::MediaError;

    fn sh(script: &str) -> CommandDescriptor {
        CommandDescriptor::new("sh").args(["-c", script])
    }

    fn run_error(err: MediaError) -> RunError {
        match err {
            MediaError::Run(e) => e,
            other => panic!("expected run error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_success() {
        CommandRunner::new().run(&sh("echo ok")).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_captures_both_streams() {
        let err = CommandRunner::new()
            .run(&sh("echo out; echo boom >&2; exit 3"))
            .await
            .unwrap_err();
        assert!(!err.is_interrupted());

        let err = run_error(err);
        assert!(matches!(err.kind, RunErrorKind::Exited(Some(3))));
        assert_eq!(err.stdout, "out\n");
        assert_eq!(err.stderr, "boom\n");
        assert!(err.command.starts_with("sh -c"));
        assert!(err.to_string().contains("stderr:\nboom"));
    }

    #[tokio::test]
    async fn test_timeout_is_classified_and_keeps_partial_output() {
        let started = Instant::now();
        let err = CommandRunner::new()
            .with_timeout(Duration::from_millis(300))
            .run(&sh("echo started; exec sleep 5"))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(err.is_interrupted());

        let err = run_error(err);
        assert!(err.is_timeout());
        assert!(matches!(err.kind, RunErrorKind::DeadlineExceeded(_)));
        assert_eq!(err.stdout, "started\n");
    }

    #[tokio::test]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let runner = CommandRunner::new().with_cancel(token.clone());

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let err = run_error(runner.run(&sh("exec sleep 5")).await.unwrap_err());
        assert!(matches!(err.kind, RunErrorKind::Cancelled));
        assert!(!err.is_timeout());
        cancel.await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = CommandRunner::new()
            .run(&CommandDescriptor::new("/nonexistent/voxreel-tool"))
            .await
            .unwrap_err();
        let err = run_error(err);
        assert!(matches!(err.kind, RunErrorKind::Spawn(_)));
    }
}
