//! Shared test helpers for adn-conv integration tests
//!
//! Each test file includes this module with `mod helpers;`, so not every
//! helper is used by every file.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adn_common::{Error, Result};
use adn_conv::models::{Job, JobStatus, JobUpdate, NewJob, SequenceInput};
use adn_conv::services::{
    JobOrchestrator, JobStore, MemoryJobStore, PipelineSettings, VisualAssetError, VisualAssetService,
};
use async_trait::async_trait;
use uuid::Uuid;

/// No pacing, small LUTs
pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        stage_delay: Duration::ZERO,
        preview_timeout: Duration::from_secs(2),
        lut_size: 5,
    }
}

pub fn slow_settings(stage_delay_ms: u64) -> PipelineSettings {
    PipelineSettings {
        stage_delay: Duration::from_millis(stage_delay_ms),
        ..fast_settings()
    }
}

pub fn sample_inputs() -> Vec<SequenceInput> {
    vec![
        SequenceInput::new("rembrandt_lumiere.adn", "ACGTACGTNN\nGGCCAATT"),
        SequenceInput::new("notes.adn", "acgtacgt acgt"),
    ]
}

/// Poll until the job reaches a terminal state
pub async fn wait_for_terminal(orchestrator: &JobOrchestrator, job_id: Uuid) -> Job {
    for _ in 0..500 {
        let job = orchestrator.status(job_id).await.expect("job exists");
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish in time", job_id);
}

/// Poll with an explicit budget, for runs sharing a file database
pub async fn wait_for_terminal_within(orchestrator: &JobOrchestrator, job_id: Uuid, budget: Duration) -> Job {
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        let job = orchestrator.status(job_id).await.expect("job exists");
        if job.is_terminal() {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} still {} at step {:?}",
            job_id,
            job.status,
            job.current_step
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Entry names of a ZIP archive
pub fn archive_entries(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid zip");
    archive.file_names().map(str::to_string).collect()
}

pub fn archive_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid zip");
    let mut file = archive.by_name(name).expect("entry exists");
    let mut out = Vec::new();
    file.read_to_end(&mut out).expect("readable entry");
    out
}

/// Preview service that always errors
pub struct FailingPreview;

#[async_trait]
impl VisualAssetService for FailingPreview {
    async fn generate(&self, _prompt: &str, _size: &str) -> std::result::Result<Vec<u8>, VisualAssetError> {
        Err(VisualAssetError::ApiError(503, "service unavailable".to_string()))
    }
}

/// Preview service returning fixed bytes
pub struct FixedPreview(pub Vec<u8>);

#[async_trait]
impl VisualAssetService for FixedPreview {
    async fn generate(&self, _prompt: &str, _size: &str) -> std::result::Result<Vec<u8>, VisualAssetError> {
        Ok(self.0.clone())
    }
}

/// Memory store that refuses the checkpoint at one progress value
pub struct FailAtProgress {
    pub inner: MemoryJobStore,
    pub progress: u8,
}

#[async_trait]
impl JobStore for FailAtProgress {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        self.inner.create(new_job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        self.inner.get(id).await
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        if update.progress == Some(self.progress) {
            return Err(Error::Internal("simulated storage outage".to_string()));
        }
        self.inner.update_partial(id, update).await
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        self.inner.append_log(id, line).await
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        self.inner.list_unfinished().await
    }
}

/// Memory store that keeps every state it persisted, in order
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryJobStore,
    pub history: Arc<Mutex<Vec<Job>>>,
}

impl RecordingStore {
    pub fn snapshots(&self) -> Vec<Job> {
        self.history.lock().unwrap().clone()
    }

    fn record(&self, job: &Job) {
        self.history.lock().unwrap().push(job.clone());
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        let job = self.inner.create(new_job).await?;
        self.record(&job);
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        self.inner.get(id).await
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        let job = self.inner.update_partial(id, update).await?;
        self.record(&job);
        Ok(job)
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        let job = self.inner.append_log(id, line).await?;
        self.record(&job);
        Ok(job)
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        self.inner.list_unfinished().await
    }
}

/// Fails one checkpoint, then rejects the first `rejections` attempts to
/// write the failed state
#[derive(Clone)]
pub struct FlakyFailureWrite {
    pub inner: MemoryJobStore,
    pub progress: u8,
    pub rejections: Arc<AtomicUsize>,
    pub failed_write_attempts: Arc<AtomicUsize>,
}

impl FlakyFailureWrite {
    pub fn new(progress: u8, rejections: usize) -> Self {
        Self {
            inner: MemoryJobStore::new(),
            progress,
            rejections: Arc::new(AtomicUsize::new(rejections)),
            failed_write_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl JobStore for FlakyFailureWrite {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        self.inner.create(new_job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        self.inner.get(id).await
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        if update.progress == Some(self.progress) {
            return Err(Error::Internal("simulated storage outage".to_string()));
        }
        if update.status == Some(JobStatus::Failed) {
            self.failed_write_attempts.fetch_add(1, Ordering::SeqCst);
            let rejected = self
                .rejections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Err(Error::Internal("database is locked".to_string()));
            }
        }
        self.inner.update_partial(id, update).await
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        self.inner.append_log(id, line).await
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        self.inner.list_unfinished().await
    }
}

/// Memory store whose reads fail, so runs cannot be started
#[derive(Clone, Default)]
pub struct UnreadableStore {
    pub inner: MemoryJobStore,
    pub created: Arc<Mutex<Vec<Uuid>>>,
}

#[async_trait]
impl JobStore for UnreadableStore {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        let job = self.inner.create(new_job).await?;
        self.created.lock().unwrap().push(job.id);
        Ok(job)
    }

    async fn get(&self, _id: Uuid) -> Result<Option<Job>> {
        Err(Error::Internal("read replica unavailable".to_string()))
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        self.inner.update_partial(id, update).await
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        self.inner.append_log(id, line).await
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        self.inner.list_unfinished().await
    }
}
