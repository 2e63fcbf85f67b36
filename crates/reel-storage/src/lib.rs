//! Video file store.
//!
//! This crate provides:
//! - The [`FileStore`] seam used by the pipeline
//! - An FTP backend that creates the target directory chain on demand
//! - A local-directory backend for dry runs and tests

pub mod error;
pub mod ftp;
pub mod local;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use ftp::{directory_chain, FtpConfig, FtpStore};
pub use local::LocalStore;
pub use store::{is_video_file, FileStore};
