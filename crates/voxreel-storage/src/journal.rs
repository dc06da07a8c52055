//! JSON-lines narration journal.

use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use voxreel_models::NarrationRecord;

use crate::error::{StorageError, StorageResult};
use crate::store::NarrationStore;

const TEMP_PREFIX: &str = ".narration.tmp-";

impl NarrationStore {
    /// Append one record to the subject's journal and return its id.
    ///
    /// The subject must exist and `id` must not already be in the journal.
    pub async fn append(
        &self,
        subject: &str,
        id: &str,
        text: &str,
        extra: Map<String, Value>,
    ) -> StorageResult<String> {
        self.existing_subject_dir(subject).await?;
        let path = self.journal_path(subject)?;

        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        if read_journal(&path)
            .await?
            .unwrap_or_default()
            .iter()
            .any(|r| r.id == id)
        {
            return Err(StorageError::duplicate_id(subject, id));
        }

        let record = NarrationRecord::new(id, text).with_extra(extra);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(subject = %subject, narration_id = %id, "Appended narration");
        Ok(record.id)
    }

    /// Merge `set` into the record `id` and drop the fields named in `unset`.
    ///
    /// The whole journal is rewritten to a temp file in the subject directory
    /// and renamed over the original. On any error the original is untouched.
    pub async fn update(
        &self,
        subject: &str,
        id: &str,
        set: &Map<String, Value>,
        unset: &[String],
    ) -> StorageResult<()> {
        let dir = self.subject_dir(subject)?;
        let path = self.journal_path(subject)?;

        let lock = self.subject_lock(subject);
        let _guard = lock.lock().await;

        let mut records = read_journal(&path)
            .await?
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::record_not_found(subject, id))?;
        record.apply(set, unset)?;

        let tmp = dir.join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4()));
        if let Err(e) = write_records(&tmp, &records).await {
            remove_quietly(&tmp).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            remove_quietly(&tmp).await;
            return Err(e.into());
        }

        info!(subject = %subject, narration_id = %id, "Updated narration");
        Ok(())
    }

    /// Every record of the subject's journal, in file order.
    ///
    /// An empty journal is created when the subject has none yet.
    pub async fn list(&self, subject: &str) -> StorageResult<Vec<NarrationRecord>> {
        self.existing_subject_dir(subject).await?;
        let path = self.journal_path(subject)?;

        match read_journal(&path).await? {
            Some(records) => Ok(records),
            None => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await?;
                Ok(Vec::new())
            }
        }
    }

    /// The record `id` of the subject's journal.
    pub async fn get(&self, subject: &str, id: &str) -> StorageResult<NarrationRecord> {
        self.list(subject)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::record_not_found(subject, id))
    }
}

/// Parse the journal at `path`; `None` when the file does not exist.
async fn read_journal(path: &Path) -> StorageResult<Option<Vec<NarrationRecord>>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| StorageError::MalformedLine {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(Some(records))
}

async fn write_records(path: &Path, records: &[NarrationRecord]) -> StorageResult<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let mut writer = BufWriter::new(file);
    for record in records {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
    }
    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temp journal");
        }
    }
}
