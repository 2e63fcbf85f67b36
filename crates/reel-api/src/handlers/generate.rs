//! Generation handlers.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::generator::GenerationJob;
use crate::metrics;
use crate::state::AppState;
use crate::types::{GenerateRequest, JobAccepted, JobResult, JobState, SyncGenerateResponse};

fn ensure_models(state: &AppState) -> ApiResult<()> {
    let missing = state.generator.missing_models();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ModelsMissing(missing))
    }
}

/// Run the generator for `job_id` and describe the output.
async fn execute(state: &AppState, job_id: &str, request: &GenerateRequest) -> ApiResult<JobResult> {
    let frames = request.num_frames();
    state
        .jobs
        .set_progress(job_id, format!("Generating {} frames...", frames))
        .await;

    tokio::fs::create_dir_all(&state.config.output_dir).await?;
    let output_path = state.config.video_path(job_id);

    let job = GenerationJob {
        prompt: request.prompt.clone(),
        negative_prompt: request.negative_prompt.clone(),
        num_frames: frames,
        width: request.width,
        height: request.height,
        steps: request.steps,
        seed: request.seed,
        output_path: output_path.clone(),
    };
    state.generator.generate(&job).await?;

    Ok(JobResult {
        video_path: output_path.to_string_lossy().into_owned(),
        download_url: format!("/download/{}", job_id),
        duration: request.duration,
        resolution: request.resolution(),
        frames,
    })
}

/// Background task behind `POST /generate`.
async fn run_job(state: AppState, job_id: String, request: GenerateRequest) {
    state
        .jobs
        .mark_processing(&job_id, "Starting generation...")
        .await;
    let start = Instant::now();

    match execute(&state, &job_id, &request).await {
        Ok(result) => {
            info!(job_id = %job_id, frames = result.frames, "Job completed");
            metrics::record_job_completed("async", start.elapsed().as_secs_f64());
            state.jobs.mark_completed(&job_id, result).await;
        }
        Err(e) => {
            error!(job_id = %job_id, "Job failed: {}", e);
            metrics::record_job_failed("async");
            state.jobs.mark_failed(&job_id, e.to_string()).await;
        }
    }
}

/// Queue a job and return immediately.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<JobAccepted>> {
    ensure_models(&state)?;
    request.validate()?;

    let job = state.jobs.create().await;
    metrics::record_job_submitted("async");
    info!(job_id = %job.job_id, resolution = %request.resolution(), "Job queued");

    tokio::spawn(run_job(state.clone(), job.job_id.clone(), request));

    Ok(Json(JobAccepted {
        job_id: job.job_id,
        status: JobState::Pending,
        progress: "Job queued".to_string(),
    }))
}

/// Generate inline and return the video as base64.
pub async fn generate_sync(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<SyncGenerateResponse>> {
    ensure_models(&state)?;
    request.validate()?;

    let job_id = state.jobs.create().await.job_id;
    metrics::record_job_submitted("sync");
    state
        .jobs
        .mark_processing(&job_id, "Starting generation...")
        .await;
    let start = Instant::now();

    let outcome = match execute(&state, &job_id, &request).await {
        Ok(result) => tokio::fs::read(&result.video_path)
            .await
            .map(|bytes| (result, bytes))
            .map_err(ApiError::from),
        Err(e) => Err(e),
    };

    let (result, bytes) = match outcome {
        Ok(done) => done,
        Err(e) => {
            error!(job_id = %job_id, "Sync generation failed: {}", e);
            metrics::record_job_failed("sync");
            state.jobs.mark_failed(&job_id, e.to_string()).await;
            return Err(e);
        }
    };

    metrics::record_job_completed("sync", start.elapsed().as_secs_f64());
    state.jobs.mark_completed(&job_id, result.clone()).await;
    info!(job_id = %job_id, bytes = bytes.len(), "Sync generation finished");

    Ok(Json(SyncGenerateResponse {
        status: "success".to_string(),
        job_id,
        video_base64: STANDARD.encode(&bytes),
        duration: result.duration,
        resolution: result.resolution,
        frames: result.frames,
        download_url: result.download_url,
    }))
}
