//! Fixed-interval status polling with a hard deadline.
//!
//! Each round fetches the status document. `COMPLETED` returns the document,
//! `FAILED` returns [`InferenceError::JobFailed`] with the remote error text,
//! anything else (including unrecognised strings) sleeps one interval and
//! polls again. Once the elapsed time reaches the deadline the loop stops
//! with [`InferenceError::Timeout`]. No jitter, no backoff.

use std::time::Duration;

use async_trait::async_trait;
use reel_models::{JobStatus, StatusDocument};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{InferenceError, InferenceResult};

/// Shortest sleep between polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between polls
    pub interval: Duration,
    /// Total wall time before giving up
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            deadline: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    /// Intervals shorter than [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            deadline,
        }
    }

    /// Sleep actually used between polls.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    /// Number of polls issued before a timeout when every poll comes back running.
    pub fn expected_polls(&self) -> u64 {
        let deadline = self.deadline.as_millis();
        let interval = self.effective_interval().as_millis();
        deadline.div_ceil(interval) as u64
    }
}

/// Anything that can report the status of a remote job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> InferenceResult<StatusDocument>;
}

/// Poll `job_id` until it reaches a terminal status or the deadline passes.
pub async fn poll_until_terminal<S>(
    source: &S,
    job_id: &str,
    policy: PollPolicy,
) -> InferenceResult<StatusDocument>
where
    S: StatusSource + ?Sized,
{
    let start = Instant::now();
    let mut polls: u64 = 0;

    while start.elapsed() < policy.deadline {
        let document = source.fetch_status(job_id).await?;
        polls += 1;

        match &document.status {
            JobStatus::Completed => {
                info!(
                    job_id = %job_id,
                    polls = polls,
                    elapsed_secs = start.elapsed().as_secs(),
                    "Job completed"
                );
                return Ok(document);
            }
            JobStatus::Failed => {
                let message = document.failure_message();
                warn!(job_id = %job_id, error = %message, "Job failed");
                return Err(InferenceError::JobFailed {
                    job_id: job_id.to_string(),
                    message,
                });
            }
            JobStatus::Unknown(raw) => {
                warn!(job_id = %job_id, status = %raw, "Unrecognised job status, still waiting");
            }
            status => {
                debug!(
                    job_id = %job_id,
                    status = %status,
                    elapsed_secs = start.elapsed().as_secs(),
                    "Job still running"
                );
            }
        }

        tokio::time::sleep(policy.effective_interval()).await;
    }

    Err(InferenceError::Timeout {
        job_id: job_id.to_string(),
        secs: policy.deadline.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::JobOutput;

    fn doc(status: JobStatus) -> StatusDocument {
        StatusDocument::with_status(status)
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_first_terminal_status() {
        let mut source = MockStatusSource::new();
        let sequence = vec![JobStatus::InQueue, JobStatus::InProgress, JobStatus::Completed];
        let mut calls = 0usize;
        source.expect_fetch_status().times(3).returning(move |_| {
            let status = sequence[calls].clone();
            calls += 1;
            let mut document = doc(status);
            document.output = Some(JobOutput {
                video_base64: Some("AAAA".into()),
                ..Default::default()
            });
            Ok(document)
        });

        let start = Instant::now();
        let document = poll_until_terminal(&source, "job-1", PollPolicy::default())
            .await
            .unwrap();

        assert_eq!(document.status, JobStatus::Completed);
        // two sleeps, no sleep after the terminal observation
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_surfaces_remote_error() {
        let mut source = MockStatusSource::new();
        source.expect_fetch_status().times(1).returning(|_| {
            let mut document = doc(JobStatus::Failed);
            document.error = Some("CUDA out of memory".into());
            Ok(document)
        });

        let err = poll_until_terminal(&source, "job-2", PollPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_job_failure());
        assert_eq!(err.to_string(), "Job job-2 failed: CUDA out of memory");
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_deadline_over_interval_polls() {
        let policy = PollPolicy::default();
        let mut source = MockStatusSource::new();
        source
            .expect_fetch_status()
            .times(policy.expected_polls() as usize)
            .returning(|_| Ok(doc(JobStatus::InProgress)));

        let err = poll_until_terminal(&source, "job-3", policy).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(!err.is_job_failure());
        assert_eq!(policy.expected_polls(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_treated_as_running() {
        let mut source = MockStatusSource::new();
        let mut calls = 0usize;
        source.expect_fetch_status().times(3).returning(move |_| {
            calls += 1;
            let status = match calls {
                1 => JobStatus::Unknown("WARMING_UP".into()),
                2 => JobStatus::Unknown("THROTTLED".into()),
                _ => JobStatus::Completed,
            };
            Ok(doc(status))
        });

        let document = poll_until_terminal(&source, "job-4", PollPolicy::default())
            .await
            .unwrap();
        assert_eq!(document.status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_propagates_without_retry() {
        let mut source = MockStatusSource::new();
        source.expect_fetch_status().times(1).returning(|_| {
            Err(InferenceError::RequestFailed {
                status: 500,
                body: "boom".into(),
            })
        });

        let err = poll_until_terminal(&source, "job-5", PollPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::RequestFailed { status: 500, .. }));
    }

    #[test]
    fn test_zero_interval_is_raised() {
        let policy = PollPolicy::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.interval, MIN_POLL_INTERVAL);
        assert_eq!(policy.expected_polls(), 100);

        let literal = PollPolicy {
            interval: Duration::ZERO,
            deadline: Duration::from_secs(1),
        };
        assert_eq!(literal.effective_interval(), MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_sleeps_between_polls() {
        let policy = PollPolicy {
            interval: Duration::ZERO,
            deadline: Duration::from_millis(50),
        };
        let mut source = MockStatusSource::new();
        source
            .expect_fetch_status()
            .times(policy.expected_polls() as usize)
            .returning(|_| Ok(StatusDocument::with_status(JobStatus::InProgress)));

        let err = poll_until_terminal(&source, "job-6", policy).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(policy.expected_polls(), 5);
    }

    #[test]
    fn test_expected_polls() {
        let policy = PollPolicy::new(Duration::from_secs(15), Duration::from_secs(600));
        assert_eq!(policy.expected_polls(), 40);
        let policy = PollPolicy::new(Duration::from_secs(7), Duration::from_secs(60));
        assert_eq!(policy.expected_polls(), 9);
    }
}
