//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while building or running media commands.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("No input: {0}")]
    EmptyInput(String),

    #[error("Invalid target duration: {0}")]
    InvalidDuration(f64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("FFprobe failed for {path}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput(what.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn probe_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True when a command was stopped by its deadline or by cancellation.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, MediaError::Run(e) if e.is_interrupted())
    }
}

/// Why a command run did not succeed.
#[derive(Debug, Error)]
pub enum RunErrorKind {
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("exited with status {}", render_exit(.0))]
    Exited(Option<i32>),

    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
}

/// A failed command run, carrying the command line and everything it printed.
#[derive(Debug, Error)]
#[error("run failed: {kind}\ncmd: {command}{}", render_streams(.stdout, .stderr))]
pub struct RunError {
    pub command: String,
    pub kind: RunErrorKind,
    pub stdout: String,
    pub stderr: String,
}

impl RunError {
    /// Deadline or cancellation, as opposed to a failure reported by the tool.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self.kind,
            RunErrorKind::DeadlineExceeded(_) | RunErrorKind::Cancelled
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, RunErrorKind::DeadlineExceeded(_))
    }
}

fn render_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

fn render_streams(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stderr.is_empty() {
        out.push_str("\nstderr:\n");
        out.push_str(stderr);
    }
    if !stdout.is_empty() {
        out.push_str("\nstdout:\n");
        out.push_str(stdout);
    }
    out
}
