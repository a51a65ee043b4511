//! Server-Sent Events for job progress
//!
//! GET /api/jobs/events[?job_id=...]: JobCreated, JobProgress,
//! JobLogAppended, JobCompleted, JobFailed

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct EventStreamQuery {
    /// Only forward events for this job
    pub job_id: Option<Uuid>,
}

pub async fn job_event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    adn_common::sse::create_event_sse_stream(&state.event_bus, "adn-conv", query.job_id)
}
