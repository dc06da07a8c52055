//! Media assembly handlers: mixdown, WAV concat, render and merge.

use std::path::{Path, PathBuf};

use tracing::info;
use voxreel_models::{ConcatPayload, MergePayload, MixdownPayload, RenderPayload};
use voxreel_storage::AssetDir;

use super::{optional_path, require};
use crate::context::TaskContext;
use crate::error::{WorkerError, WorkerResult};

const DEFAULT_RENDER_OUTPUT: &str = "out.mp4";

/// Blend background music under a narration track.
pub async fn mixdown(ctx: &TaskContext, p: MixdownPayload) -> WorkerResult<()> {
    let audio = require(&p.audio_path, "audioPath")?;
    let bgm = require(&p.bgm_path, "BGMPath")?;

    let cmd = ctx.pipeline.blend_audio(
        Path::new(audio),
        Path::new(bgm),
        optional_path(&p.filename),
        p.volume,
        p.looped,
    );
    ctx.mixdown_runner().run(&cmd).await?;

    info!(audio = %audio, bgm = %bgm, volume = p.volume, looped = p.looped, "Mixdown finished");
    Ok(())
}

/// Concatenate every narration's audio into `<subject>/<subject>.wav`.
pub async fn concat_wav(ctx: &TaskContext, p: ConcatPayload) -> WorkerResult<()> {
    let subject = require(&p.folder, "folder")?;
    let records = ctx.store.list(subject).await?;

    let wavs = records
        .iter()
        .map(|r| {
            if !r.has_audio() {
                return Err(WorkerError::MissingAudio {
                    subject: subject.to_string(),
                    id: r.id.clone(),
                });
            }
            Ok(ctx
                .store
                .asset_path(subject, AssetDir::Audio, &r.audio_id, ".wav")?)
        })
        .collect::<WorkerResult<Vec<PathBuf>>>()?;

    let dir = ctx.store.subject_dir(subject)?;
    let cmd = ctx
        .pipeline
        .concat_wav(&wavs, &dir, &format!("{}.wav", subject))
        .await?;
    ctx.runner.run(&cmd).await?;

    info!(subject = %subject, inputs = wavs.len(), "Narration audio concatenated");
    Ok(())
}

/// Render the subject's clips to exactly `dur` seconds.
pub async fn render(ctx: &TaskContext, p: RenderPayload) -> WorkerResult<()> {
    let subject = require(&p.folder, "folder")?;

    let clips = ctx
        .store
        .list_assets(subject, AssetDir::Video, ".mp4")
        .await?;
    if clips.is_empty() {
        return Err(WorkerError::NoClips(ctx.store.asset_dir(subject, AssetDir::Video)?));
    }

    let out = p
        .out
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .unwrap_or(DEFAULT_RENDER_OUTPUT);
    if Path::new(out).file_name().and_then(|n| n.to_str()) != Some(out) {
        return Err(WorkerError::invalid_payload(format!(
            "out must be a file name, got {:?}",
            out
        )));
    }
    let output = ctx.store.subject_dir(subject)?.join(out);
    let tail_cut = p.tail_cut.unwrap_or(ctx.config.default_tail_cut_secs);

    let cmd = ctx
        .pipeline
        .concat_to_duration(&clips, &output, p.dur, tail_cut, p.looped)
        .await?;
    ctx.runner.run(&cmd).await?;

    info!(
        subject = %subject,
        clips = clips.len(),
        dur = p.dur,
        tail_cut,
        looped = p.looped,
        output = %output.display(),
        "Render finished"
    );
    Ok(())
}

/// Put an audio track under a video.
pub async fn merge(ctx: &TaskContext, p: MergePayload) -> WorkerResult<()> {
    let cmd = ctx.pipeline.merge(
        Path::new(p.video_path.trim()),
        Path::new(p.audio_path.trim()),
        optional_path(&p.out_path),
    )?;
    ctx.runner.run(&cmd).await?;

    info!(video = %p.video_path, audio = %p.audio_path, "Merge finished");
    Ok(())
}
