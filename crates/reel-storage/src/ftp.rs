//! FTP file store.
//!
//! Every operation opens its own session: connect, login, switch to binary,
//! change into the target directory (creating each missing path segment),
//! do the work, quit. The FTP client is blocking, so sessions run on the
//! blocking pool.

use std::io::Cursor;

use async_trait::async_trait;
use reel_models::public_url;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::{check_filename, is_video_file, FileStore};

/// FTP store configuration.
#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Remote directory holding the videos
    pub remote_dir: String,
    /// Public HTTP base serving the FTP root
    pub base_url: String,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 21,
            user: String::new(),
            password: String::new(),
            remote_dir: "/".to_string(),
            base_url: String::new(),
        }
    }
}

impl FtpConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| StorageError::config_error(format!("{} must be set", name)))
        };

        Ok(Self {
            server: required("FTP_SERVER")?,
            port: std::env::var("FTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(21),
            user: required("FTP_USER")?,
            password: required("FTP_PASSWORD")?,
            remote_dir: std::env::var("FTP_PATH").unwrap_or_else(|_| "/".to_string()),
            base_url: required("FTP_BASE_URL")?,
        })
    }

    /// Same server, different directory.
    pub fn for_dir(&self, remote_dir: impl Into<String>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            ..self.clone()
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

/// Cumulative path prefixes of `path`, shallowest first.
///
/// `/buzz/anachronism` yields `["/buzz", "/buzz/anachronism"]`.
pub fn directory_chain(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let mut current = String::new();
    let mut chain = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if absolute || !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        chain.push(current.clone());
    }

    chain
}

/// Video store on an FTP server.
#[derive(Debug, Clone)]
pub struct FtpStore {
    config: FtpConfig,
}

impl FtpStore {
    pub fn new(config: FtpConfig) -> StorageResult<Self> {
        if config.server.is_empty() {
            return Err(StorageError::config_error("FTP server is empty"));
        }
        if config.user.is_empty() {
            return Err(StorageError::config_error("FTP user is empty"));
        }
        Ok(Self { config })
    }

    pub fn from_env() -> StorageResult<Self> {
        Self::new(FtpConfig::from_env()?)
    }

    pub fn config(&self) -> &FtpConfig {
        &self.config
    }

    /// Run `op` inside a fresh session on the blocking pool.
    async fn with_session<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> StorageResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let mut ftp = open_session(&config)?;
            let result = op(&mut ftp);
            if let Err(e) = ftp.quit() {
                debug!("FTP quit failed: {}", e);
            }
            result
        })
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("FTP task failed: {}", e)))?
    }
}

fn open_session(config: &FtpConfig) -> StorageResult<FtpStream> {
    let mut ftp = FtpStream::connect(config.address())
        .map_err(|e| StorageError::ConnectionFailed(format!("{}: {}", config.address(), e)))?;
    ftp.login(config.user.as_str(), config.password.as_str())
        .map_err(|e| StorageError::ConnectionFailed(format!("login failed: {}", e)))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| StorageError::ConnectionFailed(format!("binary mode: {}", e)))?;
    change_into(&mut ftp, &config.remote_dir)?;
    Ok(ftp)
}

/// Change into `dir`, creating each missing segment first.
fn change_into(ftp: &mut FtpStream, dir: &str) -> StorageResult<()> {
    if ftp.cwd(dir).is_ok() {
        return Ok(());
    }

    for segment in directory_chain(dir) {
        // already-existing segments fail with 550
        if let Err(e) = ftp.mkdir(&segment) {
            debug!(dir = %segment, "mkdir: {}", e);
        }
    }

    ftp.cwd(dir)
        .map_err(|e| StorageError::ConnectionFailed(format!("cannot enter {}: {}", dir, e)))
}

#[async_trait]
impl FileStore for FtpStore {
    async fn upload(&self, bytes: &[u8], filename: &str) -> StorageResult<String> {
        check_filename(filename)?;
        let name = filename.to_string();
        let data = bytes.to_vec();
        let size = data.len();

        self.with_session(move |ftp| {
            let mut reader = Cursor::new(data);
            ftp.put_file(name.as_str(), &mut reader)
                .map_err(|e| StorageError::upload_failed(format!("{}: {}", name, e)))?;
            Ok(())
        })
        .await?;

        let url = self.public_url(filename);
        info!(filename = %filename, bytes = size, url = %url, "Uploaded video");
        Ok(url)
    }

    async fn download(&self, filename: &str) -> StorageResult<Vec<u8>> {
        check_filename(filename)?;
        let name = filename.to_string();

        self.with_session(move |ftp| {
            let buffer = ftp
                .retr_as_buffer(name.as_str())
                .map_err(|e| StorageError::DownloadFailed(format!("{}: {}", name, e)))?;
            Ok(buffer.into_inner())
        })
        .await
    }

    async fn list_videos(&self) -> StorageResult<Vec<String>> {
        self.with_session(|ftp| {
            let names = ftp
                .nlst(None)
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;
            Ok(names
                .into_iter()
                .map(|n| n.rsplit('/').next().unwrap_or_default().to_string())
                .filter(|n| is_video_file(n))
                .collect())
        })
        .await
    }

    async fn delete(&self, filename: &str) -> StorageResult<bool> {
        check_filename(filename)?;
        let name = filename.to_string();

        let deleted = self
            .with_session(move |ftp| {
                let present = ftp
                    .nlst(None)
                    .map_err(|e| StorageError::ListFailed(e.to_string()))?
                    .iter()
                    .any(|n| n.rsplit('/').next() == Some(name.as_str()));
                if !present {
                    return Ok(false);
                }
                ftp.rm(name.as_str())
                    .map_err(|e| StorageError::delete_failed(format!("{}: {}", name, e)))?;
                Ok(true)
            })
            .await?;

        if !deleted {
            warn!(filename = %filename, "Nothing to delete");
        }
        Ok(deleted)
    }

    fn public_url(&self, filename: &str) -> String {
        public_url(&self.config.base_url, &self.config.remote_dir, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_chain() {
        assert_eq!(
            directory_chain("/buzz/anachronism"),
            vec!["/buzz".to_string(), "/buzz/anachronism".to_string()]
        );
        assert_eq!(directory_chain("/a//b/"), vec!["/a", "/a/b"]);
        assert_eq!(directory_chain("videos/daily"), vec!["videos", "videos/daily"]);
        assert!(directory_chain("/").is_empty());
    }

    #[test]
    fn test_public_url_uses_remote_dir() {
        let store = FtpStore::new(FtpConfig {
            server: "ftp.example.com".into(),
            user: "user".into(),
            remote_dir: "/buzz/anachronism".into(),
            base_url: "http://cdn.example.com".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            store.public_url("anachronism_20260101_090000_1.mp4"),
            "http://cdn.example.com/buzz/anachronism/anachronism_20260101_090000_1.mp4"
        );
    }

    #[test]
    fn test_missing_server_is_config_error() {
        assert!(matches!(
            FtpStore::new(FtpConfig::default()),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_rejected_before_connecting() {
        let store = FtpStore::new(FtpConfig {
            server: "127.0.0.1".into(),
            port: 1,
            user: "user".into(),
            ..Default::default()
        })
        .unwrap();

        let err = store.upload(b"x", "../escape.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
    }
}
