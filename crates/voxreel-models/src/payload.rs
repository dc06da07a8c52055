//! Typed payloads for every task type.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::task::TaskType;

/// Generate narration segments for a subject from raw source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenScriptPayload {
    pub raw_text: String,
    pub subject: String,
    pub segments: u32,
    pub min_chars: u32,
    pub max_chars: u32,
    /// Focus for the generated narrations
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub hook: String,
    /// Model override; the configured default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsAllPayload {
    pub folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsSinglePayload {
    pub folder: String,
    pub nar_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixdownPayload {
    pub audio_path: String,
    #[serde(rename = "BGMPath")]
    pub bgm_path: String,
    #[serde(default)]
    pub filename: String,
    /// Linear background volume; non-positive values fall back to the default
    #[serde(default)]
    pub volume: f64,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcatPayload {
    pub folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    pub folder: String,
    /// Target total duration in seconds
    pub dur: f64,
    /// Seconds cut from the end of every clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_cut: Option<f64>,
    /// Cycle through the clips again when one pass is shorter than `dur`
    #[serde(default, rename = "loop")]
    pub looped: bool,
    /// Output file name inside the subject directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePayload {
    pub video_path: String,
    pub audio_path: String,
    #[serde(default)]
    pub out_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenSubtitlePayload {
    pub audio_path: String,
    pub output_path: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnSubtitlePayload {
    pub video_path: String,
    pub subtitle_path: String,
    #[serde(default)]
    pub output_path: String,
}

/// A decoded task: the task type together with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRequest {
    GenScript(GenScriptPayload),
    GenTtsAll(TtsAllPayload),
    GenTtsSingle(TtsSinglePayload),
    Mixdown(MixdownPayload),
    ConcatWav(ConcatPayload),
    Render(RenderPayload),
    Merge(MergePayload),
    GenSubtitle(GenSubtitlePayload),
    BurnSubtitle(BurnSubtitlePayload),
}

impl TaskRequest {
    /// Decode a serialized payload into the shape expected by `task_type`.
    pub fn decode(task_type: TaskType, payload: &[u8]) -> ModelResult<Self> {
        fn parse<T: serde::de::DeserializeOwned>(
            task_type: TaskType,
            payload: &[u8],
        ) -> ModelResult<T> {
            serde_json::from_slice(payload)
                .map_err(|source| ModelError::InvalidPayload { task_type, source })
        }

        Ok(match task_type {
            TaskType::GenScript => TaskRequest::GenScript(parse(task_type, payload)?),
            TaskType::GenTtsAll => TaskRequest::GenTtsAll(parse(task_type, payload)?),
            TaskType::GenTtsSingle => TaskRequest::GenTtsSingle(parse(task_type, payload)?),
            TaskType::Mixdown => TaskRequest::Mixdown(parse(task_type, payload)?),
            TaskType::ConcatWav => TaskRequest::ConcatWav(parse(task_type, payload)?),
            TaskType::Render => TaskRequest::Render(parse(task_type, payload)?),
            TaskType::Merge => TaskRequest::Merge(parse(task_type, payload)?),
            TaskType::GenSubtitle => TaskRequest::GenSubtitle(parse(task_type, payload)?),
            TaskType::BurnSubtitle => TaskRequest::BurnSubtitle(parse(task_type, payload)?),
        })
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            TaskRequest::GenScript(_) => TaskType::GenScript,
            TaskRequest::GenTtsAll(_) => TaskType::GenTtsAll,
            TaskRequest::GenTtsSingle(_) => TaskType::GenTtsSingle,
            TaskRequest::Mixdown(_) => TaskType::Mixdown,
            TaskRequest::ConcatWav(_) => TaskType::ConcatWav,
            TaskRequest::Render(_) => TaskType::Render,
            TaskRequest::Merge(_) => TaskType::Merge,
            TaskRequest::GenSubtitle(_) => TaskType::GenSubtitle,
            TaskRequest::BurnSubtitle(_) => TaskType::BurnSubtitle,
        }
    }

    /// Serialize the payload alone (without the type tag).
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        let bytes = match self {
            TaskRequest::GenScript(p) => serde_json::to_vec(p)?,
            TaskRequest::GenTtsAll(p) => serde_json::to_vec(p)?,
            TaskRequest::GenTtsSingle(p) => serde_json::to_vec(p)?,
            TaskRequest::Mixdown(p) => serde_json::to_vec(p)?,
            TaskRequest::ConcatWav(p) => serde_json::to_vec(p)?,
            TaskRequest::Render(p) => serde_json::to_vec(p)?,
            TaskRequest::Merge(p) => serde_json::to_vec(p)?,
            TaskRequest::GenSubtitle(p) => serde_json::to_vec(p)?,
            TaskRequest::BurnSubtitle(p) => serde_json::to_vec(p)?,
        };
        Ok(bytes)
    }
}
