//! Video generation request model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Width and height must both be multiples of this value.
pub const RESOLUTION_MULTIPLE: u32 = 64;

/// Default clip length in seconds.
pub const DEFAULT_DURATION: f64 = 15.0;
/// Default portrait width.
pub const DEFAULT_WIDTH: u32 = 576;
/// Default portrait height.
pub const DEFAULT_HEIGHT: u32 = 1024;
/// Default sampler step count.
pub const DEFAULT_STEPS: u32 = 20;

fn default_image_strength() -> f64 {
    1.0
}

/// Generation mode, derived from whether a source image is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum GenerationMode {
    /// Text-to-video
    #[serde(rename = "T2V")]
    TextToVideo,
    /// Image-to-video
    #[serde(rename = "I2V")]
    ImageToVideo,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::TextToVideo => "T2V",
            GenerationMode::ImageToVideo => "I2V",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source image for image-conditioned generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageConditioning {
    /// Base64-encoded image bytes
    pub image_base64: String,
    /// Conditioning strength in 0.0..=1.0
    #[serde(default = "default_image_strength")]
    pub image_strength: f64,
}

/// Parameters for one remote video generation job.
///
/// Serializes to the `input` object of the inference submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// Generation prompt
    pub prompt: String,
    /// Clip length in seconds
    pub duration: f64,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Sampler steps
    pub steps: u32,
    /// Seed for reproducible output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Optional source image (I2V)
    #[serde(flatten)]
    pub image: Option<ImageConditioning>,
}

impl GenerationRequest {
    /// Create a text-to-video request with the default portrait settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration: DEFAULT_DURATION,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            steps: DEFAULT_STEPS,
            seed: None,
            image: None,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attach a source image, switching the request to I2V.
    pub fn with_image(mut self, image_base64: impl Into<String>, strength: f64) -> Self {
        self.image = Some(ImageConditioning {
            image_base64: image_base64.into(),
            image_strength: strength,
        });
        self
    }

    pub fn mode(&self) -> GenerationMode {
        if self.image.is_some() {
            GenerationMode::ImageToVideo
        } else {
            GenerationMode::TextToVideo
        }
    }

    /// Resolution in `WxH` form.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Validate the request before it is sent anywhere.
    ///
    /// Resolution is checked first so that a bad width or height always
    /// surfaces as [`ModelError::InvalidResolution`].
    pub fn validate(&self) -> ModelResult<()> {
        if self.width == 0
            || self.height == 0
            || self.width % RESOLUTION_MULTIPLE != 0
            || self.height % RESOLUTION_MULTIPLE != 0
        {
            return Err(ModelError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }

        if self.prompt.trim().is_empty() {
            return Err(ModelError::invalid_parameter("prompt is required"));
        }

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ModelError::invalid_parameter(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }

        if self.steps == 0 {
            return Err(ModelError::invalid_parameter("steps must be positive"));
        }

        if let Some(image) = &self.image {
            if image.image_base64.is_empty() {
                return Err(ModelError::invalid_parameter("image_base64 is empty"));
            }
            if !(0.0..=1.0).contains(&image.image_strength) {
                return Err(ModelError::invalid_parameter(format!(
                    "image_strength must be within 0.0..=1.0, got {}",
                    image.image_strength
                )));
            }
        }

        Ok(())
    }
}

/// Frame count for a clip of `duration` seconds at `fps`.
///
/// The generator only accepts `8k + 1` frames, so the raw count is rounded
/// down to the nearest such value (minimum 1).
pub fn frame_count(duration: f64, fps: u32) -> u32 {
    let raw = (duration * fps as f64).floor();
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    let raw = raw as u32;
    ((raw - 1) / 8) * 8 + 1
}
