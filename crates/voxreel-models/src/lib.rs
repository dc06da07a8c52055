//! Shared data models for the voxreel task engine.
//!
//! This crate provides Serde-serializable types for:
//! - Tasks, task identifiers and the closed set of task types
//! - Typed payloads for every task type
//! - Narration journal records

pub mod error;
pub mod narration;
pub mod payload;
pub mod task;

pub use error::{ModelError, ModelResult};
pub use narration::NarrationRecord;
pub use payload::{
    BurnSubtitlePayload, ConcatPayload, GenScriptPayload, GenSubtitlePayload, MergePayload,
    MixdownPayload, RenderPayload, TaskRequest, TtsAllPayload, TtsSinglePayload,
};
pub use task::{Task, TaskId, TaskType};
