//! SQLite-backed job store
//!
//! Logs are kept as a JSON array in a TEXT column; single-line appends use
//! SQLite's `json_insert` so they never rewrite the existing history.
//! Partial updates run in `BEGIN IMMEDIATE` transactions.

use adn_common::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{Job, JobStatus, JobUpdate, NewJob};
use crate::services::JobStore;

const SELECT_JOB: &str = r#"
    SELECT id, status, progress, current_step, logs, error, result_url, created_at, updated_at
    FROM jobs
    WHERE id = ?
"#;

#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, new_job: NewJob) -> Result<Job> {
        let job = Job::new(adn_common::uuid_utils::generate(), new_job, adn_common::time::now());
        let logs = serde_json::to_string(&job.logs)?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, status, progress, current_step, logs, error, result_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NULL, NULL, ?, ?)
            "#,
        )
        .bind(job.id.to_string())
        .bind(job.status.as_str())
        .bind(i64::from(job.progress))
        .bind(&job.current_step)
        .bind(&logs)
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(job_id = %job.id, "Job record created");
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(SELECT_JOB)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_job).transpose()
    }

    async fn update_partial(&self, id: Uuid, update: JobUpdate) -> Result<Job> {
        let mut conn = self.pool.acquire().await?;

        // Take the write lock before reading so concurrent read-modify-writes
        // queue on busy_timeout instead of failing to upgrade
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = apply_update(&mut *conn, id, update).await;
        let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };

        if let Err(e) = sqlx::query(finish).execute(&mut *conn).await {
            // Never hand a connection with an open transaction back to the pool
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            drop(conn.detach());
            return Err(e.into());
        }

        outcome
    }

    async fn append_log(&self, id: Uuid, line: String) -> Result<Job> {
        let result = sqlx::query(
            "UPDATE jobs SET logs = json_insert(logs, '$[#]', ?), updated_at = ? WHERE id = ?",
        )
        .bind(&line)
        .bind(adn_common::time::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Job not found: {}", id)));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))
    }

    async fn list_unfinished(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM jobs WHERE status IN ('pending', 'processing')")
                .fetch_all(&self.pool)
                .await?;

        ids.iter().map(|id| adn_common::uuid_utils::parse(id)).collect()
    }
}

/// Read, apply and write back one update inside an open transaction
async fn apply_update(conn: &mut SqliteConnection, id: Uuid, update: JobUpdate) -> Result<Job> {
    let row = sqlx::query(SELECT_JOB)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))?;

    let mut job = row_to_job(&row)?;
    job.apply(update, adn_common::time::now())?;
    let logs = serde_json::to_string(&job.logs)?;

    sqlx::query(
        r#"
        UPDATE jobs SET
            status = ?, progress = ?, current_step = ?, logs = ?,
            error = ?, result_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(job.status.as_str())
    .bind(i64::from(job.progress))
    .bind(&job.current_step)
    .bind(&logs)
    .bind(&job.error)
    .bind(&job.result_url)
    .bind(job.updated_at.to_rfc3339())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(job)
}

fn row_to_job(row: &SqliteRow) -> Result<Job> {
    let id: String = row.get("id");
    let status: String = row.get("status");
    let progress: i64 = row.get("progress");
    let logs: String = row.get("logs");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Job {
        id: adn_common::uuid_utils::parse(&id)?,
        status: JobStatus::parse(&status)?,
        progress: u8::try_from(progress)
            .map_err(|_| Error::Internal(format!("Stored progress out of range: {}", progress)))?,
        current_step: row.get("current_step"),
        logs: serde_json::from_str(&logs)?,
        error: row.get("error"),
        result_url: row.get("result_url"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}
