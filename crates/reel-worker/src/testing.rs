//! In-process fakes for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reel_inference::{GeneratedVideo, InferenceBackend, InferenceError, InferenceResult, VideoMetadata};
use reel_ledger::MemoryLedger;
use reel_models::{estimate_cost, GenerationRequest};
use reel_prompts::{PromptBrief, PromptError, PromptIdea, PromptResult, PromptSource};
use reel_social::{Profile, ScheduledPost, SocialResult, SocialScheduler};
use reel_storage::LocalStore;
use tempfile::TempDir;

use crate::accounts::{AccountRegistry, DEFAULT_ACCOUNT};
use crate::config::WorkerConfig;
use crate::pipeline::{Pipeline, Services};

/// Prompts containing `REJECT` fail at submit, `FAIL` fail remotely.
#[derive(Default)]
pub struct FakeInference {
    next_id: AtomicUsize,
    jobs: Mutex<HashMap<String, String>>,
    pub events: Mutex<Vec<String>>,
}

#[async_trait]
impl InferenceBackend for FakeInference {
    async fn submit(&self, request: &GenerationRequest) -> InferenceResult<String> {
        request.validate()?;
        if request.prompt.contains("REJECT") {
            return Err(InferenceError::RequestFailed {
                status: 500,
                body: "worker crashed".into(),
            });
        }
        let job_id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), request.prompt.clone());
        self.events.lock().unwrap().push(format!("submit {}", job_id));
        Ok(job_id)
    }

    async fn wait_for_video(&self, job_id: &str) -> InferenceResult<GeneratedVideo> {
        self.events.lock().unwrap().push(format!("wait {}", job_id));
        let prompt = self
            .jobs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_default();

        if prompt.contains("FAIL") {
            return Err(InferenceError::JobFailed {
                job_id: job_id.to_string(),
                message: "CUDA out of memory".into(),
            });
        }

        Ok(GeneratedVideo {
            job_id: job_id.to_string(),
            bytes: format!("mp4:{}", prompt).into_bytes(),
            metadata: VideoMetadata {
                duration: Some(15.0),
                resolution: Some("576x1024".into()),
                frames: Some(361),
                execution_secs: 100.0,
                cost: estimate_cost(100.0),
            },
        })
    }

    async fn check_health(&self) -> bool {
        true
    }
}

/// Hands out its ideas in order.
pub struct FakePrompts {
    ideas: Mutex<Vec<PromptIdea>>,
    pub briefs: Mutex<Vec<PromptBrief>>,
    fail: bool,
}

impl FakePrompts {
    pub fn new(prompts: &[&str]) -> Self {
        let ideas = prompts
            .iter()
            .map(|p| PromptIdea {
                prompt: p.to_string(),
                caption: format!("caption for {}", p),
                hashtags: vec!["history".into(), "ai".into()],
                hook_type: "what_if".into(),
            })
            .collect();
        Self {
            ideas: Mutex::new(ideas),
            briefs: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl PromptSource for FakePrompts {
    async fn generate(&self, brief: &PromptBrief) -> PromptResult<Vec<PromptIdea>> {
        self.briefs.lock().unwrap().push(brief.clone());
        if self.fail {
            return Err(PromptError::invalid_response("model returned prose"));
        }
        let mut ideas = self.ideas.lock().unwrap();
        let take = brief.count.min(ideas.len());
        Ok(ideas.drain(..take).collect())
    }
}

#[derive(Default)]
pub struct FakeScheduler {
    next_id: AtomicUsize,
    /// `(caption, scheduled_at, profile_id)` per scheduled post
    pub posts: Mutex<Vec<(String, DateTime<Utc>, Option<String>)>>,
    /// Post ids the scheduler still reports as pending
    pub pending: Mutex<Vec<String>>,
}

#[async_trait]
impl SocialScheduler for FakeScheduler {
    async fn upload_media(&self, _bytes: &[u8], filename: &str) -> SocialResult<String> {
        Ok(format!("media-{}", filename))
    }

    async fn schedule_post(
        &self,
        media_id: &str,
        caption: &str,
        scheduled_at: DateTime<Utc>,
        profile_id: Option<&str>,
    ) -> SocialResult<ScheduledPost> {
        let id = format!("post-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.posts.lock().unwrap().push((
            caption.to_string(),
            scheduled_at,
            profile_id.map(str::to_string),
        ));
        self.pending.lock().unwrap().push(id.clone());
        Ok(ScheduledPost {
            id: Some(id),
            media_id: Some(media_id.to_string()),
            ..Default::default()
        })
    }

    async fn scheduled_posts(&self) -> SocialResult<Vec<ScheduledPost>> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .iter()
            .map(|id| ScheduledPost {
                id: Some(id.clone()),
                ..Default::default()
            })
            .collect())
    }

    async fn delete_post(&self, post_id: &str) -> SocialResult<bool> {
        let mut pending = self.pending.lock().unwrap();
        let before = pending.len();
        pending.retain(|id| id != post_id);
        Ok(pending.len() < before)
    }

    async fn profiles(&self) -> SocialResult<Vec<Profile>> {
        Ok(Vec::new())
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub ledger: Arc<MemoryLedger>,
    pub inference: Arc<FakeInference>,
    pub prompts: Arc<FakePrompts>,
    pub scheduler: Arc<FakeScheduler>,
    pub dir: TempDir,
}

pub fn harness(prompts: FakePrompts) -> Harness {
    harness_with_ledger(prompts, MemoryLedger::new())
}

pub fn harness_with_ledger(prompts: FakePrompts, ledger: MemoryLedger) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(ledger);
    let inference = Arc::new(FakeInference::default());
    let prompts = Arc::new(prompts);
    let scheduler = Arc::new(FakeScheduler::default());

    let services = Services {
        inference: inference.clone(),
        ledger: ledger.clone(),
        store: Arc::new(LocalStore::new(dir.path(), "http://cdn.test/reels")),
        prompts: prompts.clone(),
        scheduler: Some(scheduler.clone()),
    };

    let mut account = AccountRegistry::builtin()
        .get(DEFAULT_ACCOUNT)
        .unwrap()
        .clone();
    account.destination_profile_id = Some("profile-anachronism".into());

    Harness {
        pipeline: Pipeline::new(account, WorkerConfig::default(), services),
        ledger,
        inference,
        prompts,
        scheduler,
        dir,
    }
}
