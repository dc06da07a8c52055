//! Binary assets stored next to a subject's journal.

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::{AssetDir, NarrationStore};

impl NarrationStore {
    /// Write `bytes` as `<subject>/<dir>/<name><ext>` and return the name and
    /// full path.
    ///
    /// Fails with `AssetExists` when the target is already there. A partially
    /// written file is removed before the error is returned.
    pub async fn save_asset(
        &self,
        subject: &str,
        dir: AssetDir,
        name: &str,
        ext: &str,
        bytes: &[u8],
    ) -> StorageResult<(String, PathBuf)> {
        let path = self.asset_path(subject, dir, name, ext)?;
        self.existing_subject_dir(subject).await?;
        fs::create_dir_all(self.asset_dir(subject, dir)?).await?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AssetExists(path));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(rm) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %rm, "Failed to remove partial asset");
            }
            return Err(e.into());
        }

        debug!(
            subject = %subject,
            path = %path.display(),
            bytes = bytes.len(),
            "Saved asset"
        );
        Ok((name.to_string(), path))
    }

    /// Remove an asset. Returns false when there was nothing to remove.
    pub async fn remove_asset(
        &self,
        subject: &str,
        dir: AssetDir,
        name: &str,
        ext: &str,
    ) -> StorageResult<bool> {
        let path = self.asset_path(subject, dir, name, ext)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn asset_exists(
        &self,
        subject: &str,
        dir: AssetDir,
        name: &str,
        ext: &str,
    ) -> StorageResult<bool> {
        let path = self.asset_path(subject, dir, name, ext)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Files in `<subject>/<dir>` whose extension matches `ext`
    /// case-insensitively, sorted by file name. A missing directory yields an
    /// empty list.
    pub async fn list_assets(
        &self,
        subject: &str,
        dir: AssetDir,
        ext: &str,
    ) -> StorageResult<Vec<PathBuf>> {
        let dir = self.asset_dir(subject, dir)?;
        let want = ext.trim_start_matches('.');

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if has_extension(&path, want) {
                found.push(path);
            }
        }
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(found)
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, NarrationStore) {
        let tmp = TempDir::new().unwrap();
        let store = NarrationStore::new(tmp.path());
        store.create_subject("demo").await.unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn test_save_asset_is_create_exclusive() {
        let (_tmp, store) = store().await;

        let (name, path) = store
            .save_asset("demo", AssetDir::Audio, "0000", ".wav", b"RIFF")
            .await
            .unwrap();
        assert_eq!(name, "0000");
        assert!(path.ends_with("demo/audio/0000.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");

        let err = store
            .save_asset("demo", AssetDir::Audio, "0000", ".wav", b"other")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AssetExists(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn test_save_asset_validation() {
        let (_tmp, store) = store().await;
        assert!(matches!(
            store.save_asset("demo", AssetDir::Audio, "x", "wav", b"").await,
            Err(StorageError::InvalidExtension(_))
        ));
        assert!(matches!(
            store.save_asset("ghost", AssetDir::Audio, "x", ".wav", b"").await,
            Err(StorageError::SubjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_exists() {
        let (_tmp, store) = store().await;
        store
            .save_asset("demo", AssetDir::Audio, "0001", ".wav", b"x")
            .await
            .unwrap();

        assert!(store.asset_exists("demo", AssetDir::Audio, "0001", ".wav").await.unwrap());
        assert!(store.remove_asset("demo", AssetDir::Audio, "0001", ".wav").await.unwrap());
        assert!(!store.remove_asset("demo", AssetDir::Audio, "0001", ".wav").await.unwrap());
        assert!(!store.asset_exists("demo", AssetDir::Audio, "0001", ".wav").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_assets_sorted_case_insensitive() {
        let (tmp, store) = store().await;
        assert!(store.list_assets("demo", AssetDir::Video, ".mp4").await.unwrap().is_empty());

        let asset = tmp.path().join("demo").join("asset");
        std::fs::create_dir_all(asset.join("nested.mp4")).unwrap();
        for name in ["b.mp4", "A.MP4", "c.mov", "a2.Mp4"] {
            std::fs::write(asset.join(name), b"").unwrap();
        }

        let names: Vec<String> = store
            .list_assets("demo", AssetDir::Video, ".mp4")
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["A.MP4", "a2.Mp4", "b.mp4"]);
    }
}
