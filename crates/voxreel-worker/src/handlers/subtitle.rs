//! Subtitle generation and burn-in.

use std::path::Path;

use tracing::info;
use voxreel_models::{BurnSubtitlePayload, GenSubtitlePayload};

use super::optional_path;
use crate::context::TaskContext;
use crate::error::WorkerResult;

/// Transcribe an audio file into an SRT subtitle file.
pub async fn generate(ctx: &TaskContext, p: GenSubtitlePayload) -> WorkerResult<()> {
    let cmd = ctx.subtitler.generate(
        Path::new(p.audio_path.trim()),
        Path::new(p.output_path.trim()),
        Some(p.lang.as_str()),
    )?;
    ctx.runner.run(&cmd).await?;

    info!(
        audio = %p.audio_path,
        output = %p.output_path,
        lang = %p.lang,
        "Subtitles generated"
    );
    Ok(())
}

/// Burn a subtitle file into a video.
pub async fn burn(ctx: &TaskContext, p: BurnSubtitlePayload) -> WorkerResult<()> {
    let cmd = ctx.pipeline.burn_subtitle(
        Path::new(p.video_path.trim()),
        Path::new(p.subtitle_path.trim()),
        optional_path(&p.output_path),
    )?;
    ctx.runner.run(&cmd).await?;

    info!(
        video = %p.video_path,
        subtitles = %p.subtitle_path,
        output = %p.output_path,
        "Subtitles burned"
    );
    Ok(())
}
