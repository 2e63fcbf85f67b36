//! Local directory file store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_models::public_url;
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::store::{check_filename, is_video_file, FileStore};

/// Videos kept in a local directory, served under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStore for LocalStore {
    async fn upload(&self, bytes: &[u8], filename: &str) -> StorageResult<String> {
        check_filename(filename)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(filename), bytes).await?;

        let url = self.public_url(filename);
        info!(filename = %filename, bytes = bytes.len(), url = %url, "Stored video");
        Ok(url)
    }

    async fn download(&self, filename: &str) -> StorageResult<Vec<u8>> {
        check_filename(filename)?;
        match tokio::fs::read(self.root.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(filename))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_videos(&self) -> StorageResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if is_video_file(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, filename: &str) -> StorageResult<bool> {
        check_filename(filename)?;
        match tokio::fs::remove_file(self.root.join(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::delete_failed(format!("{}: {}", filename, e))),
        }
    }

    fn public_url(&self, filename: &str) -> String {
        public_url(&self.base_url, "", filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_list_download_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("videos"), "http://localhost:8080/videos");

        let url = store.upload(b"video bytes", "acct_20260101_090000_1.mp4").await.unwrap();
        assert_eq!(url, "http://localhost:8080/videos/acct_20260101_090000_1.mp4");
        tokio::fs::write(dir.path().join("videos/readme.txt"), b"x").await.unwrap();

        assert_eq!(
            store.list_videos().await.unwrap(),
            vec!["acct_20260101_090000_1.mp4"]
        );
        assert_eq!(
            store.download("acct_20260101_090000_1.mp4").await.unwrap(),
            b"video bytes"
        );

        assert!(store.delete("acct_20260101_090000_1.mp4").await.unwrap());
        assert!(!store.delete("acct_20260101_090000_1.mp4").await.unwrap());
        assert!(matches!(
            store.download("acct_20260101_090000_1.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("absent"), "http://localhost");
        assert!(store.list_videos().await.unwrap().is_empty());
    }
}
