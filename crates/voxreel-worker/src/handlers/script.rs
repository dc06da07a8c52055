//! Script generation: raw text in, narration journal out.

use serde_json::Map;
use tracing::{debug, info};
use voxreel_models::GenScriptPayload;

use super::require;
use crate::context::TaskContext;
use crate::error::WorkerResult;
use crate::prompt::PromptConfig;

/// Generate narration segments and append them to a fresh subject journal
/// with ids `0000`, `0001`, ...
pub async fn generate_script(ctx: &TaskContext, p: GenScriptPayload) -> WorkerResult<()> {
    let subject = require(&p.subject, "subject")?;
    require(&p.raw_text, "rawText")?;

    let prompt = ctx.prompts.system(&PromptConfig {
        subject: subject.to_string(),
        segments: p.segments,
        min_chars: p.min_chars,
        max_chars: p.max_chars,
        focus: p.focus.clone(),
        hook: p.hook.clone(),
    })?;

    let model = p
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(ctx.config.gemini_model.as_str());

    let segments = ctx
        .script_generator
        .generate_script(model, &p.raw_text, &prompt)
        .await?;

    let dir = ctx.store.create_subject(subject).await?;
    for (i, text) in segments.iter().enumerate() {
        let id = ctx
            .store
            .append(subject, &format!("{:04}", i), text, Map::new())
            .await?;
        debug!(subject = %subject, narration_id = %id, "Narration appended");
    }

    info!(
        subject = %subject,
        dir = %dir.display(),
        model = %model,
        requested = p.segments,
        generated = segments.len(),
        min_chars = p.min_chars,
        max_chars = p.max_chars,
        raw_bytes = p.raw_text.len(),
        raw_chars = p.raw_text.chars().count(),
        "Script generated"
    );
    Ok(())
}
