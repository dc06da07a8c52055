//! Model error types.

use thiserror::Error;

use crate::task::TaskType;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Invalid payload for {task_type}: {source}")]
    InvalidPayload {
        task_type: TaskType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field '{0}' cannot be modified")]
    ProtectedField(String),

    #[error("Field '{field}' must be a string")]
    InvalidFieldType { field: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn protected_field(field: impl Into<String>) -> Self {
        Self::ProtectedField(field.into())
    }
}
