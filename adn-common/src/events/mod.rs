//! Event types for the ADN event system
//!
//! Provides the shared job event definitions and the EventBus used to fan
//! them out to SSE clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// ADN job events
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AdnEvent {
    /// Job record created and queued for execution
    JobCreated {
        job_id: Uuid,
        input_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Stage checkpoint persisted
    JobProgress {
        job_id: Uuid,
        progress: u8,
        current_step: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One line appended to the job log
    JobLogAppended {
        job_id: Uuid,
        line: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Package stored and job completed
    JobCompleted {
        job_id: Uuid,
        result_url: String,
        artifact_count: usize,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Job terminated with an error
    JobFailed {
        job_id: Uuid,
        error_message: String,
        progress: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl AdnEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            AdnEvent::JobCreated { .. } => "JobCreated",
            AdnEvent::JobProgress { .. } => "JobProgress",
            AdnEvent::JobLogAppended { .. } => "JobLogAppended",
            AdnEvent::JobCompleted { .. } => "JobCompleted",
            AdnEvent::JobFailed { .. } => "JobFailed",
        }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            AdnEvent::JobCreated { job_id, .. }
            | AdnEvent::JobProgress { job_id, .. }
            | AdnEvent::JobLogAppended { job_id, .. }
            | AdnEvent::JobCompleted { job_id, .. }
            | AdnEvent::JobFailed { job_id, .. } => *job_id,
        }
    }
}

/// Broadcast channel for job events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AdnEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AdnEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: AdnEvent) -> Result<usize, broadcast::error::SendError<AdnEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AdnEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
