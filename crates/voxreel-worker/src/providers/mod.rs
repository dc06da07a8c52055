//! External content providers: script generation and speech synthesis.

pub mod gemini;
pub mod volc;

use async_trait::async_trait;

use crate::error::WorkerResult;

pub use gemini::GeminiClient;
pub use volc::{VolcTtsClient, VolcTtsConfig};

/// Turns raw source text into narration segments.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(
        &self,
        model: &str,
        content: &str,
        system_prompt: &str,
    ) -> WorkerResult<Vec<String>>;
}

/// Turns narration text into audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>>;
}
