//! Speech-to-subtitle via whisper.cpp.

use std::path::{Path, PathBuf};

use crate::command::CommandDescriptor;
use crate::error::{MediaError, MediaResult};

/// Language passed to whisper when the caller leaves it blank.
pub const AUTO_LANGUAGE: &str = "auto";

/// Builds whisper.cpp invocations that write an SRT file.
#[derive(Debug, Clone)]
pub struct WhisperSubtitler {
    binary: String,
    model: PathBuf,
}

impl WhisperSubtitler {
    pub fn new(binary: impl Into<String>, model: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
        }
    }

    /// Describe a transcription of `audio` into `output`.
    ///
    /// whisper appends `.srt` to the `-of` prefix itself, so the extension of
    /// `output` is stripped before it is passed on.
    pub fn generate(
        &self,
        audio: &Path,
        output: &Path,
        lang: Option<&str>,
    ) -> MediaResult<CommandDescriptor> {
        if self.binary.trim().is_empty() {
            return Err(MediaError::invalid_argument("whisper binary is not configured"));
        }
        if self.model.as_os_str().is_empty() {
            return Err(MediaError::invalid_argument("whisper model is not configured"));
        }
        if audio.as_os_str().is_empty() || output.as_os_str().is_empty() {
            return Err(MediaError::invalid_argument("audio path or output path is empty"));
        }

        let lang = match lang.map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => AUTO_LANGUAGE,
        };
        let prefix = output.with_extension("");
        // whisper appends ".srt" to the prefix verbatim, dots included.
        let mut srt = prefix.clone().into_os_string();
        srt.push(".srt");
        let srt = PathBuf::from(srt);

        Ok(CommandDescriptor::new(self.binary.clone())
            .arg("-m")
            .path_arg(&self.model)
            .arg("-f")
            .path_arg(audio)
            .arg("-osrt")
            .args(["-l", lang])
            .arg("-of")
            .path_arg(&prefix)
            .input(audio)
            .input(&self.model)
            .output(srt))
    }
}
