//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider request failed: {0}")]
    ProviderFailed(String),

    #[error("Prompt rendering failed: {0}")]
    PromptFailed(String),

    #[error("Narration {id} not found in subject {subject}")]
    RecordNotFound { subject: String, id: String },

    #[error("Narration {id} in subject {subject} has no audio")]
    MissingAudio { subject: String, id: String },

    #[error("No mp4 files found in {}", .0.display())]
    NoClips(PathBuf),

    #[error("Model error: {0}")]
    Model(#[from] voxreel_models::ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] voxreel_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] voxreel_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] voxreel_queue::QueueError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn provider_failed(msg: impl Into<String>) -> Self {
        Self::ProviderFailed(msg.into())
    }

    /// Subprocess stopped by its deadline or by cancellation, as opposed to
    /// a failure reported by the tool itself.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WorkerError::Media(e) if e.is_interrupted())
    }
}
