//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Checkout of the generation pipeline (holds `.venv/`)
    pub ltx2_path: PathBuf,
    /// Directory holding the model weights
    pub model_dir: PathBuf,
    /// Where generated videos are written
    pub output_dir: PathBuf,
    /// Hard limit on one generation run
    pub generation_timeout: Duration,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 20 * 1024 * 1024, // image-conditioned requests carry base64
            ltx2_path: PathBuf::from("/workspace/LTX-2"),
            model_dir: PathBuf::from("/workspace/models"),
            output_dir: PathBuf::from("/workspace/outputs"),
            generation_timeout: Duration::from_secs(600),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            ltx2_path: std::env::var("LTX2_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ltx2_path),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            generation_timeout: Duration::from_secs(
                std::env::var("GENERATION_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Output path of the video for `job_id`.
    pub fn video_path(&self, job_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", job_id))
    }
}
