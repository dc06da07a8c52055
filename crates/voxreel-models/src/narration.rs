//! Narration journal records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};

/// One line of a subject's narration journal.
///
/// `id`, `text` and `audio_id` are typed; any other field written by a caller
/// is kept in `extra` and survives every rewrite of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationRecord {
    pub id: String,
    pub text: String,
    /// Empty until a TTS task has produced audio for this narration
    #[serde(default)]
    pub audio_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NarrationRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            audio_id: String::new(),
            extra: Map::new(),
        }
    }

    /// Attach extra fields. Keys colliding with the typed fields are ignored.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        for (key, value) in extra {
            if !matches!(key.as_str(), "id" | "text" | "audio_id") {
                self.extra.insert(key, value);
            }
        }
        self
    }

    pub fn has_audio(&self) -> bool {
        !self.audio_id.is_empty()
    }

    /// Merge `set` into the record, then remove every field named in `unset`.
    ///
    /// `id` is immutable and `text` cannot be removed. The record is left
    /// untouched when any field is rejected.
    pub fn apply(&mut self, set: &Map<String, Value>, unset: &[String]) -> ModelResult<()> {
        for (key, value) in set {
            match key.as_str() {
                "id" => return Err(ModelError::protected_field("id")),
                "text" | "audio_id" => {
                    string_field(key, value)?;
                }
                _ => {}
            }
        }
        if let Some(key) = unset.iter().find(|k| matches!(k.as_str(), "id" | "text")) {
            return Err(ModelError::protected_field(key.as_str()));
        }

        for (key, value) in set {
            match key.as_str() {
                "text" => self.text = string_field(key, value)?,
                "audio_id" => self.audio_id = string_field(key, value)?,
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }

        for key in unset {
            match key.as_str() {
                "audio_id" => self.audio_id.clear(),
                _ => {
                    self.extra.remove(key);
                }
            }
        }

        Ok(())
    }
}

fn string_field(field: &str, value: &Value) -> ModelResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ModelError::InvalidFieldType {
            field: field.to_string(),
        })
}
