//! Job status, listing and download handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{JobListResponse, JobRecord};

fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    state
        .jobs
        .get(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.jobs.list().await,
    })
}

/// Serve `{output_dir}/{job_id}.mp4`.
pub async fn download_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::not_found("Video not found"));
    }

    let bytes = match tokio::fs::read(state.config.video_path(&job_id)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("Video not found"))
        }
        Err(e) => return Err(e.into()),
    };

    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.mp4\"", job_id),
        ),
    ];
    Ok((headers, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_validation() {
        assert!(is_valid_job_id("ab12cd34"));
        assert!(!is_valid_job_id("../etc/passwd"));
        assert!(!is_valid_job_id(""));
    }
}
