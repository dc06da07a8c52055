//! Speech synthesis for narration records.

use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, info};
use voxreel_models::{NarrationRecord, TtsAllPayload, TtsSinglePayload};
use voxreel_storage::AssetDir;

use super::require;
use crate::context::TaskContext;
use crate::error::{WorkerError, WorkerResult};

const WAV_EXT: &str = ".wav";

/// Synthesize every record of a subject.
///
/// Records whose audio is already recorded and present on disk are skipped,
/// so a rerun after a partial failure resumes where it stopped.
pub async fn synthesize_all(ctx: &TaskContext, p: TtsAllPayload) -> WorkerResult<()> {
    let subject = require(&p.folder, "folder")?;
    let records = ctx.store.list(subject).await?;

    let mut synthesized = 0usize;
    let mut skipped = 0usize;
    for record in &records {
        if record.has_audio()
            && ctx
                .store
                .asset_exists(subject, AssetDir::Audio, &record.audio_id, WAV_EXT)
                .await?
        {
            debug!(subject = %subject, narration_id = %record.id, "Audio present, skipping");
            skipped += 1;
            continue;
        }
        synthesize_record(ctx, subject, record).await?;
        synthesized += 1;
    }

    info!(
        subject = %subject,
        total = records.len(),
        synthesized,
        skipped,
        "Narration audio synthesized"
    );
    Ok(())
}

/// Synthesize one record, replacing any audio it already has.
pub async fn synthesize_single(ctx: &TaskContext, p: TtsSinglePayload) -> WorkerResult<()> {
    let subject = require(&p.folder, "folder")?;
    let nar_id = require(&p.nar_id, "narId")?;

    let record = ctx
        .store
        .list(subject)
        .await?
        .into_iter()
        .find(|r| r.id == nar_id)
        .ok_or_else(|| WorkerError::RecordNotFound {
            subject: subject.to_string(),
            id: nar_id.to_string(),
        })?;

    let path = synthesize_record(ctx, subject, &record).await?;
    info!(subject = %subject, narration_id = %record.id, path = %path.display(), "Narration audio replaced");
    Ok(())
}

/// Synthesize `record`, store `audio/<id>.wav` and point `audio_id` at it.
async fn synthesize_record(
    ctx: &TaskContext,
    subject: &str,
    record: &NarrationRecord,
) -> WorkerResult<PathBuf> {
    let audio = ctx.synthesizer.synthesize(&record.text).await.map_err(|e| {
        WorkerError::provider_failed(format!("tts failed for narration {}: {}", record.id, e))
    })?;

    // A wav left behind by an interrupted run would block the exclusive create.
    if ctx
        .store
        .remove_asset(subject, AssetDir::Audio, &record.id, WAV_EXT)
        .await?
    {
        debug!(subject = %subject, narration_id = %record.id, "Removed previous audio");
    }
    let (audio_id, path) = ctx
        .store
        .save_asset(subject, AssetDir::Audio, &record.id, WAV_EXT, &audio)
        .await?;

    let mut set = Map::new();
    set.insert("audio_id".to_string(), Value::String(audio_id.clone()));
    ctx.store.update(subject, &record.id, &set, &[]).await?;

    debug!(
        subject = %subject,
        narration_id = %record.id,
        audio_id = %audio_id,
        bytes = audio.len(),
        "Audio saved"
    );
    Ok(path)
}
