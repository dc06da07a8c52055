//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;
use voxreel_models::ModelError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during journal and asset operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid subject name: {0:?}")]
    InvalidSubject(String),

    #[error("Invalid asset name: {0:?}")]
    InvalidName(String),

    #[error("Invalid extension {0:?}: must start with '.'")]
    InvalidExtension(String),

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Journal not found: {0}")]
    NotFound(PathBuf),

    #[error("Narration {id} not found in subject {subject}")]
    RecordNotFound { subject: String, id: String },

    #[error("Narration {id} already exists in subject {subject}")]
    DuplicateId { subject: String, id: String },

    #[error("bad jsonl line {line} in {}: {source}", .path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Asset already exists: {0}")]
    AssetExists(PathBuf),

    #[error(transparent)]
    Record(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn record_not_found(subject: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            subject: subject.into(),
            id: id.into(),
        }
    }

    pub fn duplicate_id(subject: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            subject: subject.into(),
            id: id.into(),
        }
    }

    /// True for any of the "it isn't there" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::SubjectNotFound(_)
                | StorageError::NotFound(_)
                | StorageError::RecordNotFound { .. }
        )
    }
}
