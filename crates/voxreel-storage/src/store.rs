//! Store root, subject layout and per-subject write locks.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::fs;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Journal file name inside a subject directory.
pub const JOURNAL_FILE: &str = "narration.txt";

/// Asset subdirectories of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetDir {
    /// Synthesized narration audio
    Audio,
    /// Source video clips
    Video,
}

impl AssetDir {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetDir::Audio => "audio",
            AssetDir::Video => "asset",
        }
    }
}

/// Narration journal and asset store rooted at a local directory.
///
/// Layout per subject:
///
/// ```text
/// <root>/<subject>/narration.txt
/// <root>/<subject>/audio/<id>.wav
/// <root>/<subject>/asset/*.mp4
/// ```
///
/// `append` and `update` on the same subject are serialized within this
/// process. Writers in other processes are not coordinated.
#[derive(Debug, Clone)]
pub struct NarrationStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl NarrationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<subject>`, after validating that `subject` is one plain path
    /// component.
    pub fn subject_dir(&self, subject: &str) -> StorageResult<PathBuf> {
        if !is_plain_component(subject) {
            return Err(StorageError::InvalidSubject(subject.to_string()));
        }
        Ok(self.root.join(subject))
    }

    pub fn journal_path(&self, subject: &str) -> StorageResult<PathBuf> {
        Ok(self.subject_dir(subject)?.join(JOURNAL_FILE))
    }

    pub fn asset_dir(&self, subject: &str, dir: AssetDir) -> StorageResult<PathBuf> {
        Ok(self.subject_dir(subject)?.join(dir.dir_name()))
    }

    /// Path of asset `<name><ext>`, whether or not it exists.
    pub fn asset_path(
        &self,
        subject: &str,
        dir: AssetDir,
        name: &str,
        ext: &str,
    ) -> StorageResult<PathBuf> {
        if !is_plain_component(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        if !ext.starts_with('.') {
            return Err(StorageError::InvalidExtension(ext.to_string()));
        }
        Ok(self.asset_dir(subject, dir)?.join(format!("{}{}", name, ext)))
    }

    /// Create the subject directory and its audio subdirectory.
    ///
    /// Existing directories are left as they are.
    pub async fn create_subject(&self, subject: &str) -> StorageResult<PathBuf> {
        let dir = self.subject_dir(subject)?;
        fs::create_dir_all(dir.join(AssetDir::Audio.dir_name())).await?;
        debug!(subject = %subject, dir = %dir.display(), "Subject directory ready");
        Ok(dir)
    }

    /// Existing subject directory, or `SubjectNotFound`.
    pub(crate) async fn existing_subject_dir(&self, subject: &str) -> StorageResult<PathBuf> {
        let dir = self.subject_dir(subject)?;
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StorageError::SubjectNotFound(subject.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::SubjectNotFound(subject.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write lock for one subject's journal.
    ///
    /// Entries nobody holds any more are dropped, so the map only keeps
    /// subjects with a write in flight.
    pub(crate) fn subject_lock(&self, subject: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|name, lock| name == subject || Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(subject.to_string()).or_default())
    }
}

fn is_plain_component(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
