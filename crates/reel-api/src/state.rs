//! Application state.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::generator::{LtxCliGenerator, VideoGenerator};
use crate::job_store::JobStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub jobs: JobStore,
    pub generator: Arc<dyn VideoGenerator>,
}

impl AppState {
    /// State with the CLI generator described by `config`.
    pub fn new(config: ApiConfig) -> Self {
        let generator = LtxCliGenerator::new(
            config.ltx2_path.clone(),
            config.model_dir.clone(),
            config.generation_timeout,
        );
        Self::with_generator(config, Arc::new(generator))
    }

    /// State with an explicit generator and a fresh job store.
    pub fn with_generator(config: ApiConfig, generator: Arc<dyn VideoGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            jobs: JobStore::new(),
            generator,
        }
    }
}
