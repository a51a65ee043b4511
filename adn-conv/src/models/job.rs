//! Conversion job record and its state machine
//!
//! PENDING → PROCESSING → {COMPLETED | FAILED}
//!
//! Every write to a job goes through [`Job::apply`], which rejects updates
//! that would break the record's invariants: terminal states are final,
//! progress never decreases, logs only grow, and exactly one of
//! `error` / `result_url` is present once terminal.

use adn_common::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, waiting for the background run to start
    Pending,
    /// Pipeline running
    Processing,
    /// Package stored and downloadable
    Completed,
    /// Pipeline stopped on an error
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(Error::Internal(format!("Unknown job status: {}", other))),
        }
    }

    /// Allowed edges of the state machine (staying put is always allowed)
    fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally observable job state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// 0-100
    pub progress: u8,
    pub current_step: String,
    /// `[HH:MM:SS] message` lines, oldest first
    pub logs: Vec<String>,
    pub error: Option<String>,
    pub result_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Initial fields for a job record
#[derive(Debug, Clone)]
pub struct NewJob {
    pub current_step: String,
    pub logs: Vec<String>,
}

impl NewJob {
    /// Pending job with a single seed log line
    pub fn queued(seed_line: String) -> Self {
        Self {
            current_step: "Queued".to_string(),
            logs: vec![seed_line],
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub current_step: Option<String>,
    pub logs: Option<Vec<String>>,
    pub error: Option<String>,
    pub result_url: Option<String>,
}

impl JobUpdate {
    /// Stage checkpoint: PROCESSING at `progress` with a new step label
    pub fn checkpoint(progress: u8, current_step: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(progress),
            current_step: Some(current_step.into()),
            ..Default::default()
        }
    }

    pub fn completed(result_url: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            current_step: Some("Completed".to_string()),
            result_url: Some(result_url.into()),
            ..Default::default()
        }
    }

    /// Progress and step are deliberately left at their last values
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn logs(logs: Vec<String>) -> Self {
        Self {
            logs: Some(logs),
            ..Default::default()
        }
    }

    fn touches_state(&self) -> bool {
        self.status.is_some()
            || self.progress.is_some()
            || self.current_step.is_some()
            || self.error.is_some()
            || self.result_url.is_some()
    }
}

impl Job {
    pub fn new(id: Uuid, new_job: NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            current_step: new_job.current_step,
            logs: new_job.logs,
            error: None,
            result_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a partial update, or leave the job untouched and return
    /// `Error::InvalidTransition`
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) -> Result<()> {
        if self.is_terminal() && update.touches_state() {
            return Err(Error::InvalidTransition(format!(
                "job {} is {} and can no longer change state",
                self.id, self.status
            )));
        }

        let mut next = self.clone();

        if let Some(status) = update.status {
            if !self.status.can_transition_to(status) {
                return Err(Error::InvalidTransition(format!(
                    "job {} cannot move from {} to {}",
                    self.id, self.status, status
                )));
            }
            next.status = status;
        }

        if let Some(progress) = update.progress {
            if progress > 100 {
                return Err(Error::InvalidTransition(format!(
                    "progress {} is out of range",
                    progress
                )));
            }
            if progress < self.progress {
                return Err(Error::InvalidTransition(format!(
                    "progress cannot decrease from {} to {}",
                    self.progress, progress
                )));
            }
            next.progress = progress;
        }

        if let Some(step) = update.current_step {
            next.current_step = step;
        }

        if let Some(logs) = update.logs {
            if !logs.starts_with(&self.logs) {
                return Err(Error::InvalidTransition(format!(
                    "log history of job {} is append-only",
                    self.id
                )));
            }
            next.logs = logs;
        }

        if update.error.is_some() {
            next.error = update.error;
        }
        if update.result_url.is_some() {
            next.result_url = update.result_url;
        }

        next.check_invariants()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Append one log line; allowed in every state, including terminal ones
    pub fn append_log(&mut self, line: String, now: DateTime<Utc>) {
        self.logs.push(line);
        self.updated_at = now;
    }

    fn check_invariants(&self) -> Result<()> {
        let violation = match self.status {
            JobStatus::Completed if self.progress != 100 => Some("completed job must be at 100%"),
            JobStatus::Completed if self.result_url.is_none() => Some("completed job needs a result url"),
            JobStatus::Completed if self.error.is_some() => Some("completed job cannot carry an error"),
            JobStatus::Failed if self.error.is_none() => Some("failed job needs an error"),
            JobStatus::Failed if self.result_url.is_some() => Some("failed job cannot carry a result url"),
            JobStatus::Failed if self.progress == 100 => Some("failed job cannot be at 100%"),
            JobStatus::Pending | JobStatus::Processing
                if self.error.is_some() || self.result_url.is_some() =>
            {
                Some("error and result url are only set on terminal jobs")
            }
            JobStatus::Pending | JobStatus::Processing if self.progress == 100 => {
                Some("only completed jobs reach 100%")
            }
            _ => None,
        };

        match violation {
            Some(reason) => Err(Error::InvalidTransition(format!("job {}: {}", self.id, reason))),
            None => Ok(()),
        }
    }
}
