//! File store seam.

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// A flat directory of video files with public URLs.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` as `filename` and return its public URL.
    async fn upload(&self, bytes: &[u8], filename: &str) -> StorageResult<String>;

    async fn download(&self, filename: &str) -> StorageResult<Vec<u8>>;

    /// Names of the `.mp4` files in the directory.
    async fn list_videos(&self) -> StorageResult<Vec<String>>;

    /// Remove `filename`. Returns `false` if it was not there.
    async fn delete(&self, filename: &str) -> StorageResult<bool>;

    /// Public URL of `filename`.
    fn public_url(&self, filename: &str) -> String;
}

pub fn is_video_file(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".mp4")
}

/// Reject names that would escape the flat directory.
pub(crate) fn check_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename == "."
        || filename == ".."
    {
        return Err(StorageError::InvalidName(filename.to_string()));
    }
    Ok(())
}
