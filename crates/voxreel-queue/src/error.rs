//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Submission cancelled before the task was queued")]
    Cancelled,

    #[error("Worker pool is shut down")]
    Closed,
}

impl QueueError {
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
