//! Content pipeline orchestration.
//!
//! This crate provides:
//! - A [`Pipeline`] wired to the inference, ledger, storage, prompt and
//!   scheduler services of one account
//! - Batch, single, daily and posting run modes
//! - Structured job logging

pub mod accounts;
pub mod batch;
pub mod config;
pub mod daily;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod posting;
pub mod report;

#[cfg(test)]
mod testing;

pub use accounts::{AccountRegistry, DEFAULT_ACCOUNT};
pub use batch::SingleReport;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use pipeline::{Pipeline, Services};
pub use report::{BatchReport, DailyReport, PostOutcome, PostReport, ScheduleReport};
