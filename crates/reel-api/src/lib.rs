//! HTTP job server for local video generation.
//!
//! This crate provides:
//! - Async (`POST /generate`) and inline (`POST /generate/sync`) generation
//! - An injectable, keyed [`JobStore`] for job tracking
//! - A [`VideoGenerator`] seam with a CLI-backed implementation
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod job_store;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use generator::{GenerationError, GenerationJob, LtxCliGenerator, LtxCommand, VideoGenerator};
pub use job_store::JobStore;
pub use routes::create_router;
pub use state::AppState;
