//! Job API handlers
//!
//! POST /api/jobs, GET /api/jobs/:id, GET /api/jobs/:id/download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{Job, SequenceInput},
    services::StoredPackage,
    AppState,
};

/// POST /api/jobs request
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub files: Vec<SequenceInput>,
}

/// POST /api/jobs
///
/// Creates the job and returns it immediately (201); conversion continues in
/// the background.
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state.orchestrator.submit(request.files).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/:id
pub async fn get_job(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> ApiResult<Json<Job>> {
    let job = state.orchestrator.status(job_id).await?;
    tracing::debug!(job_id = %job_id, status = %job.status, progress = job.progress, "Status query");
    Ok(Json(job))
}

/// GET /api/jobs/:id/download
///
/// 404 until the job has completed.
pub async fn download_job(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> ApiResult<Response> {
    let package = state.orchestrator.download(job_id).await?;

    tracing::info!(job_id = %job_id, bytes = package.archive.len(), "Serving package");

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", StoredPackage::file_name(job_id)),
            ),
        ],
        package.archive.clone(),
    )
        .into_response())
}

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/:id", get(get_job))
        .route("/api/jobs/:id/download", get(download_job))
}
