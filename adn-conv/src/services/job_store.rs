//! Job record storage
//!
//! [`JobStore`] is the seam between the orchestrator and persistence. Every
//! implementation routes writes through [`Job::apply`], so the job invariants
//! hold regardless of backend.

use std::collections::HashMap;
use std::sync::Arc;

use adn_common::{Error, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Job, JobUpdate, NewJob};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new pending job
    async fn create(&self, new_job: NewJob) -> Result<Job>;

    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Validate and persist a partial update, returning the updated job
    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job>;

    /// Append one log line
    ///
    /// The default reads the whole log field and writes it back; stores with
    /// a list-append primitive should override it.
    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        let job = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))?;

        let mut logs = job.logs;
        logs.push(line);
        self.update_partial(id, JobUpdate::logs(logs)).await
    }

    /// Ids of jobs still pending or processing
    async fn list_unfinished(&self) -> Result<Vec<Uuid>>;
}

/// Process-local store, used by tests and `--in-memory` runs
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        let job = Job::new(adn_common::uuid_utils::generate(), new_job, adn_common::time::now());
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))?;
        job.apply(update, adn_common::time::now())?;
        Ok(job.clone())
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))?;
        job.append_log(line, adn_common::time::now());
        Ok(job.clone())
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| !job.is_terminal())
            .map(|job| job.id)
            .collect())
    }
}
