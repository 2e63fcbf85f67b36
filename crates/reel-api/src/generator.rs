//! Video generator seam and the CLI-backed implementation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Checkpoint of the two-stage pipeline.
pub const CHECKPOINT_FILE: &str = "ltx-2-19b-dev-fp8.safetensors";
/// Distilled LoRA applied in the second stage.
pub const DISTILLED_LORA_FILE: &str = "ltx-2-19b-distilled-lora-384.safetensors";
/// Spatial x2 upsampler.
pub const UPSAMPLER_FILE: &str = "ltx-2-spatial-upscaler-x2-1.0.safetensors";
/// Text encoder directory.
pub const GEMMA_DIR: &str = "gemma";

/// Python module running the pipeline.
const PIPELINE_MODULE: &str = "ltx_pipelines.ti2vid_two_stages";

pub type GenerationResult<T> = Result<T, GenerationError>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to start generator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Generation timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Generation failed: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Generator produced no video at {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_frames: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub seed: Option<u64>,
    pub output_path: PathBuf,
}

/// Produces a video file for a job.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Write the video for `job` to `job.output_path`.
    async fn generate(&self, job: &GenerationJob) -> GenerationResult<()>;

    /// Model files that are not in place; empty when ready.
    fn missing_models(&self) -> Vec<String>;

    fn models_ready(&self) -> bool {
        self.missing_models().is_empty()
    }
}

/// Required model entries under `model_dir` that do not exist.
pub fn missing_models(model_dir: &Path) -> Vec<String> {
    let files = [CHECKPOINT_FILE, DISTILLED_LORA_FILE, UPSAMPLER_FILE]
        .into_iter()
        .filter(|name| !model_dir.join(name).is_file());
    let dirs = std::iter::once(GEMMA_DIR).filter(|name| !model_dir.join(name).is_dir());

    files.chain(dirs).map(str::to_string).collect()
}

/// Builder for pipeline CLI invocations.
#[derive(Debug, Clone)]
pub struct LtxCommand {
    model_dir: PathBuf,
    prompt: String,
    output: PathBuf,
    args: Vec<String>,
}

impl LtxCommand {
    pub fn new(
        model_dir: impl AsRef<Path>,
        prompt: impl Into<String>,
        output: impl AsRef<Path>,
    ) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            prompt: prompt.into(),
            output: output.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Build from a job description.
    pub fn for_job(model_dir: impl AsRef<Path>, job: &GenerationJob) -> Self {
        let cmd = Self::new(model_dir, &job.prompt, &job.output_path)
            .num_frames(job.num_frames)
            .size(job.width, job.height)
            .steps(job.steps)
            .negative_prompt(&job.negative_prompt);

        match job.seed {
            Some(seed) => cmd.seed(seed),
            None => cmd,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn num_frames(self, frames: u32) -> Self {
        self.arg("--num-frames").arg(frames.to_string())
    }

    pub fn size(self, width: u32, height: u32) -> Self {
        self.arg("--width")
            .arg(width.to_string())
            .arg("--height")
            .arg(height.to_string())
    }

    pub fn steps(self, steps: u32) -> Self {
        self.arg("--num-inference-steps").arg(steps.to_string())
    }

    /// Skipped when empty.
    pub fn negative_prompt(self, text: &str) -> Self {
        if text.is_empty() {
            self
        } else {
            self.arg("--negative-prompt").arg(text)
        }
    }

    pub fn seed(self, seed: u64) -> Self {
        self.arg("--seed").arg(seed.to_string())
    }

    fn model_path(&self, name: &str) -> String {
        self.model_dir.join(name).to_string_lossy().into_owned()
    }

    /// Arguments after the interpreter.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            PIPELINE_MODULE.to_string(),
            "--checkpoint-path".to_string(),
            self.model_path(CHECKPOINT_FILE),
            "--distilled-lora".to_string(),
            self.model_path(DISTILLED_LORA_FILE),
            "--spatial-upsampler-path".to_string(),
            self.model_path(UPSAMPLER_FILE),
            "--gemma-root".to_string(),
            self.model_path(GEMMA_DIR),
            "--prompt".to_string(),
            self.prompt.clone(),
            "--output-path".to_string(),
            self.output.to_string_lossy().into_owned(),
        ];
        args.extend(self.args.iter().cloned());
        args.push("--enable-fp8".to_string());
        args
    }
}

/// Runs the pipeline from its checkout's virtualenv.
#[derive(Debug, Clone)]
pub struct LtxCliGenerator {
    ltx2_path: PathBuf,
    model_dir: PathBuf,
    timeout: Duration,
}

impl LtxCliGenerator {
    pub fn new(ltx2_path: impl Into<PathBuf>, model_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ltx2_path: ltx2_path.into(),
            model_dir: model_dir.into(),
            timeout,
        }
    }

    pub fn python(&self) -> PathBuf {
        self.ltx2_path.join(".venv").join("bin").join("python")
    }
}

#[async_trait]
impl VideoGenerator for LtxCliGenerator {
    async fn generate(&self, job: &GenerationJob) -> GenerationResult<()> {
        let args = LtxCommand::for_job(&self.model_dir, job).build_args();
        debug!("Running generator: {} {}", self.python().display(), args.join(" "));

        let mut child = Command::new(self.python())
            .args(&args)
            .current_dir(&self.ltx2_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(GenerationError::Spawn)?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let secs = self.timeout.as_secs();
                warn!("Generator timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                return Err(GenerationError::Timeout { secs });
            }
        };

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(GenerationError::Failed {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !job.output_path.is_file() {
            return Err(GenerationError::MissingOutput(job.output_path.clone()));
        }

        info!(
            output = %job.output_path.display(),
            frames = job.num_frames,
            "Generation finished"
        );
        Ok(())
    }

    fn missing_models(&self) -> Vec<String> {
        missing_models(&self.model_dir)
    }
}
