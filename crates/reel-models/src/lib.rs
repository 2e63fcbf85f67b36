//! Shared data models for the reel content pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video generation requests and their validation
//! - Remote job status documents
//! - Ledger rows, columns and lifecycle stages
//! - Account profiles
//! - Cost and file naming helpers

pub mod account;
pub mod cost;
pub mod error;
pub mod generation;
pub mod job_status;
pub mod ledger;
pub mod naming;

// Re-export common types
pub use account::AccountProfile;
pub use cost::{estimate_cost, COST_PER_SECOND};
pub use error::{ModelError, ModelResult};
pub use generation::{frame_count, GenerationMode, GenerationRequest, RESOLUTION_MULTIPLE};
pub use job_status::{JobOutput, JobStatus, StatusDocument};
pub use ledger::{LedgerColumn, LedgerRow, LedgerStage, NewLedgerEntry};
pub use naming::{public_url, video_filename};
