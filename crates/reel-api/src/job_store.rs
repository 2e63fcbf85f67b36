//! In-process job tracking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::types::{JobRecord, JobResult, JobState, JobSummary};

/// Length of generated job ids.
pub const JOB_ID_LEN: usize = 8;

/// Jobs keyed by id. Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending job and return its record.
    pub async fn create(&self) -> JobRecord {
        let mut job_id = Uuid::new_v4().simple().to_string();
        job_id.truncate(JOB_ID_LEN);

        let record = JobRecord {
            job_id: job_id.clone(),
            status: JobState::Pending,
            progress: Some("Job queued".to_string()),
            result: None,
            error: None,
            created_at: Utc::now(),
        };

        self.jobs.write().await.insert(job_id, record.clone());
        debug!(job_id = %record.job_id, "Job created");
        record
    }

    pub async fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn set_progress(&self, job_id: &str, progress: impl Into<String>) -> bool {
        self.update(job_id, |job| job.progress = Some(progress.into()))
            .await
    }

    pub async fn mark_processing(&self, job_id: &str, progress: impl Into<String>) -> bool {
        self.update(job_id, |job| {
            job.status = JobState::Processing;
            job.progress = Some(progress.into());
        })
        .await
    }

    pub async fn mark_completed(&self, job_id: &str, result: JobResult) -> bool {
        self.update(job_id, |job| {
            job.status = JobState::Completed;
            job.progress = Some("Done".to_string());
            job.result = Some(result);
        })
        .await
    }

    pub async fn mark_failed(&self, job_id: &str, error: impl Into<String>) -> bool {
        self.update(job_id, |job| {
            job.status = JobState::Failed;
            job.error = Some(error.into());
        })
        .await
    }

    /// All jobs, oldest first.
    pub async fn list(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read().await;
        let mut records: Vec<&JobRecord> = jobs.values().collect();
        records.sort_by_key(|job| job.created_at);
        records
            .into_iter()
            .map(|job| JobSummary {
                job_id: job.job_id.clone(),
                status: job.status,
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Terminal jobs never change again.
    async fn update(&self, job_id: &str, apply: impl FnOnce(&mut JobRecord)) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(job) if !job.status.is_terminal() => {
                apply(job);
                true
            }
            _ => false,
        }
    }
}
