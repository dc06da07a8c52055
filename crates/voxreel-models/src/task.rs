//! Task definitions for queue processing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ModelError;

static TASK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a task.
///
/// Generated ids look like `task_<unix-nanos>_<seq>`; the sequence number keeps
/// ids distinct when two tasks are created within the same clock tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new timestamp-derived task ID.
    pub fn new() -> Self {
        let nanos = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
        let seq = TASK_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("task_{}_{}", nanos, seq))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of task. Every variant maps to exactly one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Generate narration segments from raw text
    #[serde(rename = "script.gen")]
    GenScript,
    /// Synthesize audio for every narration of a subject
    #[serde(rename = "tts.all.gen")]
    GenTtsAll,
    /// Synthesize audio for a single narration
    #[serde(rename = "tts.single.gen")]
    GenTtsSingle,
    /// Blend background music under a voice track
    #[serde(rename = "mix.audio.bgm")]
    Mixdown,
    /// Concatenate narration wavs into one track
    #[serde(rename = "concat.wav")]
    ConcatWav,
    /// Render the clip assets to a target duration
    #[serde(rename = "render.mp4")]
    Render,
    /// Mux a video stream with an audio stream
    #[serde(rename = "m4a.merge.mp4")]
    Merge,
    /// Generate subtitles from audio
    #[serde(rename = "audio.gen.srt")]
    GenSubtitle,
    /// Burn subtitles into a video
    #[serde(rename = "mp4.brun.sub")]
    BurnSubtitle,
}

impl TaskType {
    /// All task types, in declaration order.
    pub const ALL: [TaskType; 9] = [
        TaskType::GenScript,
        TaskType::GenTtsAll,
        TaskType::GenTtsSingle,
        TaskType::Mixdown,
        TaskType::ConcatWav,
        TaskType::Render,
        TaskType::Merge,
        TaskType::GenSubtitle,
        TaskType::BurnSubtitle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::GenScript => "script.gen",
            TaskType::GenTtsAll => "tts.all.gen",
            TaskType::GenTtsSingle => "tts.single.gen",
            TaskType::Mixdown => "mix.audio.bgm",
            TaskType::ConcatWav => "concat.wav",
            TaskType::Render => "render.mp4",
            TaskType::Merge => "m4a.merge.mp4",
            TaskType::GenSubtitle => "audio.gen.srt",
            TaskType::BurnSubtitle => "mp4.brun.sub",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownTaskType(s.to_string()))
    }
}

/// One unit of asynchronous work.
///
/// The payload is kept as serialized bytes until a worker decodes it for the
/// handler registered to `task_type`.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    payload: Vec<u8>,
}

impl Task {
    pub fn new(task_type: TaskType, payload: Vec<u8>) -> Self {
        Self {
            id: TaskId::new(),
            task_type,
            payload,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
