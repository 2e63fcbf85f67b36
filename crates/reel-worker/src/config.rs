//! Worker configuration.

use reel_models::GenerationRequest;

/// Categories used by the daily prompt phase.
pub const DEFAULT_CATEGORIES: [&str; 4] = [
    "cute animals",
    "vintage documentary",
    "nature scenery",
    "comedic moments",
];

/// Pipeline run settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Clip length in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    /// Prompts generated per daily run
    pub daily_prompt_count: usize,
    /// Videos generated and scheduled per daily run
    pub daily_video_count: usize,
    /// Upper bound for `post all`
    pub post_limit: usize,
    pub categories: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let request = GenerationRequest::new("");
        Self {
            duration: request.duration,
            width: request.width,
            height: request.height,
            steps: request.steps,
            daily_prompt_count: 5,
            daily_video_count: 5,
            post_limit: 5,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            duration: std::env::var("VIDEO_DURATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.duration),
            width: std::env::var("VIDEO_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.width),
            height: std::env::var("VIDEO_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.height),
            steps: std::env::var("VIDEO_STEPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.steps),
            daily_prompt_count: std::env::var("DAILY_PROMPT_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.daily_prompt_count),
            daily_video_count: std::env::var("DAILY_VIDEO_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.daily_video_count),
            post_limit: defaults.post_limit,
            categories: std::env::var("DAILY_CATEGORIES")
                .map(|s| {
                    s.split(',')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.categories),
        }
    }

    /// Generation request for `prompt` with the configured settings.
    pub fn request_for(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt)
            .with_duration(self.duration)
            .with_resolution(self.width, self.height)
            .with_steps(self.steps)
    }
}
