//! Collaborators shared by every task handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use voxreel_media::{
    CommandRunner, DurationProbe, FfprobeDurationProbe, MediaPipelineBuilder, WhisperSubtitler,
};
use voxreel_storage::NarrationStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::prompt::PromptRenderer;
use crate::providers::{
    GeminiClient, ScriptGenerator, SpeechSynthesizer, VolcTtsClient, VolcTtsConfig,
};

/// Everything a handler needs, injected once at startup.
pub struct TaskContext {
    pub config: WorkerConfig,
    pub store: NarrationStore,
    pub pipeline: MediaPipelineBuilder,
    /// Runner carrying the default command deadline
    pub runner: CommandRunner,
    pub subtitler: WhisperSubtitler,
    pub script_generator: Arc<dyn ScriptGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub prompts: PromptRenderer,
}

impl TaskContext {
    /// Assemble a context around the given providers and duration probe.
    ///
    /// Commands are killed when `cancel` fires.
    pub fn new(
        config: WorkerConfig,
        script_generator: Arc<dyn ScriptGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        probe: Arc<dyn DurationProbe>,
        cancel: CancellationToken,
    ) -> Self {
        let runner = CommandRunner::new()
            .with_timeout(config.command_timeout)
            .with_cancel(cancel);

        Self {
            store: NarrationStore::new(config.store_dir.clone()),
            pipeline: MediaPipelineBuilder::new(config.ffmpeg_bin.clone(), probe),
            subtitler: WhisperSubtitler::new(
                config.whisper_bin.clone(),
                config.whisper_model.clone(),
            ),
            runner,
            script_generator,
            synthesizer,
            prompts: PromptRenderer::default(),
            config,
        }
    }

    /// Build the production context: Gemini, Volcengine TTS and ffprobe.
    pub fn from_config(config: WorkerConfig, cancel: CancellationToken) -> WorkerResult<Self> {
        let gemini = GeminiClient::new(config.gemini_api_key.clone())?
            .with_base_url(config.gemini_base_url.clone());
        let tts = VolcTtsClient::new(VolcTtsConfig {
            endpoint: config.tts_endpoint.clone(),
            api_key: config.tts_api_key.clone(),
            cluster: config.tts_cluster.clone(),
            voice_type: config.tts_voice_type.clone(),
            ..VolcTtsConfig::default()
        })?;
        let probe = FfprobeDurationProbe::new(config.ffprobe_bin.clone());

        Ok(Self::new(
            config,
            Arc::new(gemini),
            Arc::new(tts),
            Arc::new(probe),
            cancel,
        ))
    }

    /// Runner for audio mixdowns, which get their own deadline.
    pub fn mixdown_runner(&self) -> CommandRunner {
        self.runner.clone().with_timeout(self.config.mixdown_timeout)
    }
}
