//! One handler per task type.

pub mod media;
pub mod script;
pub mod subtitle;
pub mod tts;

use std::path::Path;

use crate::error::{WorkerError, WorkerResult};

/// Reject a blank payload field.
fn require<'a>(value: &'a str, field: &str) -> WorkerResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkerError::invalid_payload(format!("{} is empty", field)));
    }
    Ok(value)
}

/// Optional output path: blank means "use the builder's default".
fn optional_path(value: &str) -> Option<&Path> {
    let value = value.trim();
    (!value.is_empty()).then(|| Path::new(value))
}
