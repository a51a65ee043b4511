//! Conversion job orchestration
//!
//! Owns the job lifecycle after submission: spawns one background run per
//! job, drives analysis and assembly through fixed progress checkpoints,
//! persists progress and log lines after every stage, and publishes the
//! finished package.
//!
//! Stage bodies live in `phase_analysis` and `phase_assembly`; the preview
//! side channel lives in `preview`.

mod phase_analysis;
mod phase_assembly;
mod preview;
pub mod stages;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use adn_common::events::{AdnEvent, EventBus};
use adn_common::{Error, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::analyzer::SequenceAnalyzer;
use crate::assembler::{ArtifactAssembler, DEFAULT_LUT_SIZE};
use crate::models::{validate_batch, Job, JobStatus, JobUpdate, NewJob, SequenceInput};
use crate::services::job_store::JobStore;
use crate::services::package_store::{PackageStore, StoredPackage};
use crate::services::visual_asset_client::VisualAssetService;
use crate::utils::retry_transient;
pub use stages::{Stage, StageError};

pub const QUEUED_LOG_MESSAGE: &str = "JOB QUEUED. WAITING FOR WORKER...";
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by service restart";

/// Time budget for writing a job's failed state
const TERMINAL_WRITE_MAX_WAIT: Duration = Duration::from_secs(5);

/// Tunables for pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Pause after each stage's work, for human-paced progress
    pub stage_delay: Duration,
    /// Upper bound on one preview generation attempt
    pub preview_timeout: Duration,
    pub lut_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(1000),
            preview_timeout: Duration::from_secs(60),
            lut_size: DEFAULT_LUT_SIZE,
        }
    }
}

/// Download location of a completed job's package
pub fn result_url(job_id: Uuid) -> String {
    format!("/api/jobs/{}/download", job_id)
}

#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    packages: PackageStore,
    event_bus: EventBus,
    analyzer: Arc<SequenceAnalyzer>,
    assembler: Arc<ArtifactAssembler>,
    visual_assets: Option<Arc<dyn VisualAssetService>>,
    settings: PipelineSettings,
    active_runs: Arc<Mutex<HashSet<Uuid>>>,
}

/// Registry slot for one running job; released on drop
struct ActiveRun {
    job_id: Uuid,
    registry: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        if let Ok(mut runs) = self.registry.lock() {
            runs.remove(&self.job_id);
        }
    }
}

impl JobOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, event_bus: EventBus, settings: PipelineSettings) -> Self {
        Self {
            store,
            packages: PackageStore::new(),
            event_bus,
            analyzer: Arc::new(SequenceAnalyzer::default()),
            assembler: Arc::new(ArtifactAssembler::new(settings.lut_size)),
            visual_assets: None,
            settings,
            active_runs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Enable preview generation
    pub fn with_visual_assets(mut self, service: Arc<dyn VisualAssetService>) -> Self {
        self.visual_assets = Some(service);
        self
    }

    pub fn with_analyzer(mut self, analyzer: SequenceAnalyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Validate a batch, create its job and start the run in the background
    ///
    /// Returns the freshly created (pending) job without waiting on the
    /// pipeline.
    pub async fn submit(&self, inputs: Vec<SequenceInput>) -> Result<Job> {
        validate_batch(&inputs)?;

        let seed = adn_common::time::stamp_log_line(Utc::now(), QUEUED_LOG_MESSAGE);
        let job = self.store.create(NewJob::queued(seed)).await?;

        tracing::info!(job_id = %job.id, inputs = inputs.len(), "Conversion job created");

        self.event_bus.emit_lossy(AdnEvent::JobCreated {
            job_id: job.id,
            input_count: inputs.len(),
            timestamp: Utc::now(),
        });

        if let Err(e) = self.start_run(job.id, inputs).await {
            tracing::error!(job_id = %job.id, error = %e, "Failed to start conversion run");
            self.record_failure(job.id, format!("Failed to start conversion: {}", e))
                .await;
            return Err(e);
        }
        Ok(job)
    }

    /// Spawn the pipeline for a pending job
    ///
    /// At most one run per job: a second call while the first is active, or
    /// for a job that already left `pending`, is rejected.
    pub async fn start_run(&self, job_id: Uuid, inputs: Vec<SequenceInput>) -> Result<JoinHandle<()>> {
        let slot = self.claim_run(job_id)?;

        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", job_id)))?;
        if job.status != JobStatus::Pending {
            return Err(Error::InvalidTransition(format!(
                "job {} is {} and cannot be run again",
                job_id, job.status
            )));
        }

        let orchestrator = self.clone();
        Ok(tokio::spawn(async move {
            let _slot = slot;
            tracing::info!(job_id = %job_id, "Background conversion task started");
            orchestrator.run(job_id, inputs).await;
        }))
    }

    pub fn is_running(&self, job_id: Uuid) -> bool {
        self.active_runs
            .lock()
            .map(|runs| runs.contains(&job_id))
            .unwrap_or(false)
    }

    pub async fn status(&self, job_id: Uuid) -> Result<Job> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", job_id)))
    }

    /// Archive of a completed job; NotFound for unknown or unfinished jobs
    pub async fn download(&self, job_id: Uuid) -> Result<Arc<StoredPackage>> {
        let job = self.status(job_id).await?;
        if job.status != JobStatus::Completed {
            return Err(Error::NotFound(format!(
                "Result not ready for job {} ({})",
                job_id, job.status
            )));
        }

        self.packages
            .get(job_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Package not available for job {}", job_id)))
    }

    /// Fail jobs a previous process left pending or processing
    ///
    /// Their packages only ever lived in that process's memory.
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let stale = self.store.list_unfinished().await?;

        for job_id in &stale {
            let job = self
                .store
                .update_partial(*job_id, JobUpdate::failed(INTERRUPTED_MESSAGE))
                .await?;
            tracing::warn!(job_id = %job_id, progress = job.progress, "Marked interrupted job as failed");

            self.event_bus.emit_lossy(AdnEvent::JobFailed {
                job_id: *job_id,
                error_message: INTERRUPTED_MESSAGE.to_string(),
                progress: job.progress,
                timestamp: Utc::now(),
            });
        }

        Ok(stale.len())
    }

    fn claim_run(&self, job_id: Uuid) -> Result<ActiveRun> {
        let mut runs = self
            .active_runs
            .lock()
            .map_err(|_| Error::Internal("active run registry poisoned".to_string()))?;

        if !runs.insert(job_id) {
            return Err(Error::InvalidTransition(format!(
                "job {} already has an active run",
                job_id
            )));
        }

        Ok(ActiveRun {
            job_id,
            registry: Arc::clone(&self.active_runs),
        })
    }

    async fn run(&self, job_id: Uuid, inputs: Vec<SequenceInput>) {
        let started = Instant::now();

        match self.execute(job_id, &inputs, started).await {
            Ok(()) => {
                tracing::info!(
                    job_id = %job_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Conversion job completed"
                );
            }
            Err(error) => self.handle_failure(job_id, error).await,
        }
    }

    async fn execute(
        &self,
        job_id: Uuid,
        inputs: &[SequenceInput],
        started: Instant,
    ) -> std::result::Result<(), StageError> {
        self.phase_initialize(job_id)
            .await
            .map_err(StageError::at(Stage::Initialize))?;

        let profile = self
            .phase_parse_inputs(job_id, inputs)
            .await
            .map_err(StageError::at(Stage::ParseInputs))?;

        let result = self
            .phase_derive_metrics(job_id, profile)
            .await
            .map_err(StageError::at(Stage::DeriveSecondaryMetrics))?;

        let preview = self
            .phase_preview(job_id, &result)
            .await
            .map_err(StageError::at(Stage::DeriveSecondaryMetrics))?;

        let (descriptor, context) = self
            .phase_generate_descriptor(job_id, &result, preview)
            .await
            .map_err(StageError::at(Stage::GenerateDescriptor))?;

        let formats = self
            .phase_compile_formats(job_id, &result, &descriptor)
            .await
            .map_err(StageError::at(Stage::CompileOutputFormats))?;

        let stored = self
            .phase_assemble_package(job_id, &result, &descriptor, formats, &context)
            .await
            .map_err(StageError::at(Stage::AssemblePackage))?;

        self.complete(job_id, &stored, started)
            .await
            .map_err(StageError::at(Stage::Complete))
    }

    async fn complete(&self, job_id: Uuid, stored: &StoredPackage, started: Instant) -> anyhow::Result<()> {
        let url = result_url(job_id);
        self.store
            .update_partial(job_id, JobUpdate::completed(url.clone()))
            .await?;

        self.event_bus.emit_lossy(AdnEvent::JobProgress {
            job_id,
            progress: Stage::Complete.progress(),
            current_step: Stage::Complete.label().to_string(),
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(AdnEvent::JobCompleted {
            job_id,
            result_url: url,
            artifact_count: stored.entry_count,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        // The job is already terminal; a lost closing line must not fail it
        if let Err(e) = self.log(job_id, "✓ MISSION ACCOMPLISHED. PACKAGE READY.").await {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to append completion log line");
        }

        Ok(())
    }

    /// Record a core-stage failure as the job's terminal state
    async fn handle_failure(&self, job_id: Uuid, error: StageError) {
        tracing::error!(
            job_id = %job_id,
            stage = %error.stage,
            error = %error.message,
            "Conversion job failed"
        );

        if self.packages.discard(job_id).await {
            tracing::debug!(job_id = %job_id, "Discarded package of failed job");
        }

        self.record_failure(job_id, error.to_string()).await;
    }

    /// Write the failed state, retrying transient store errors, then log and
    /// announce it
    async fn record_failure(&self, job_id: Uuid, message: String) {
        let store = &self.store;
        let failed = retry_transient("record job failure", TERMINAL_WRITE_MAX_WAIT, || {
            store.update_partial(job_id, JobUpdate::failed(message.clone()))
        })
        .await;

        match failed {
            Ok(job) => {
                if let Err(e) = self.log(job_id, &format!("✗ PIPELINE HALTED: {}", message)).await {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to append failure log line");
                }
                self.event_bus.emit_lossy(AdnEvent::JobFailed {
                    job_id,
                    error_message: message,
                    progress: job.progress,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                // Left for recover_interrupted on the next start
                tracing::error!(job_id = %job_id, error = %e, "Failed to record job failure");
            }
        }
    }

    /// Persist a stage checkpoint and announce it
    async fn checkpoint(&self, job_id: Uuid, stage: Stage) -> Result<Job> {
        let job = self
            .store
            .update_partial(job_id, JobUpdate::checkpoint(stage.progress(), stage.label()))
            .await?;

        tracing::debug!(job_id = %job_id, stage = %stage, progress = stage.progress(), "Stage checkpoint");

        self.event_bus.emit_lossy(AdnEvent::JobProgress {
            job_id,
            progress: job.progress,
            current_step: job.current_step.clone(),
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Append a timestamped line to the job log
    async fn log(&self, job_id: Uuid, message: &str) -> Result<Job> {
        let line = adn_common::time::stamp_log_line(Utc::now(), message);
        let job = self.store.append_log(job_id, line.clone()).await?;

        self.event_bus.emit_lossy(AdnEvent::JobLogAppended {
            job_id,
            line,
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    async fn pace(&self) {
        if !self.settings.stage_delay.is_zero() {
            tokio::time::sleep(self.settings.stage_delay).await;
        }
    }
}
