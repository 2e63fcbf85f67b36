//! Client for the serverless GPU video-generation backend.
//!
//! Collapses the job lifecycle into one component:
//! - [`InferenceClient::submit`] validates a request and queues a job
//! - [`poller::poll_until_terminal`] polls at a fixed interval up to a hard deadline
//! - [`decode::decode_video`] turns a completed status document into video bytes
//!
//! A timeout only stops the local poll loop; the remote job is never cancelled.

pub mod backend;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod poller;

pub use backend::InferenceBackend;
pub use client::InferenceClient;
pub use config::InferenceConfig;
pub use decode::{decode_video, image_to_base64, GeneratedVideo, VideoMetadata};
pub use error::{InferenceError, InferenceResult};
pub use poller::{poll_until_terminal, PollPolicy, StatusSource};
