//! SQLite job store tests
//!
//! In-memory databases use a single connection so every query sees the same
//! database; concurrency is exercised against a file database opened through
//! the production pool.

mod helpers;

use std::sync::Arc;

use adn_common::events::EventBus;
use adn_common::Error;
use adn_conv::db::{init_database_pool, init_tables, SqliteJobStore};
use adn_conv::models::{JobStatus, JobUpdate, NewJob};
use adn_conv::services::{JobOrchestrator, JobStore};
use helpers::*;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::task::JoinSet;

async fn memory_store() -> SqliteJobStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    init_tables(&pool).await.expect("schema");
    SqliteJobStore::new(pool)
}

#[tokio::test]
async fn test_create_and_get_round_trip() {
    let store = memory_store().await;
    let created = store.create(NewJob::queued("[00:00:00] seed".to_string())).await.unwrap();

    let fetched = store.get(created.id).await.unwrap().expect("stored");
    assert_eq!(fetched.status, JobStatus::Pending);
    assert_eq!(fetched.progress, 0);
    assert_eq!(fetched.current_step, "Queued");
    assert_eq!(fetched.logs, vec!["[00:00:00] seed".to_string()]);
    assert!(fetched.error.is_none());
    assert!(fetched.result_url.is_none());
    assert_eq!(fetched.created_at.timestamp(), created.created_at.timestamp());
}

#[tokio::test]
async fn test_get_unknown_returns_none() {
    let store = memory_store().await;
    assert!(store.get(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_append_log_keeps_order() {
    let store = memory_store().await;
    let job = store.create(NewJob::queued("first".to_string())).await.unwrap();

    for line in ["second", "third \"quoted\"", "fourth ✓"] {
        store.append_log(job.id, line.to_string()).await.unwrap();
    }

    let job = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(job.logs, vec!["first", "second", "third \"quoted\"", "fourth ✓"]);
}

#[tokio::test]
async fn test_append_log_to_unknown_job_is_not_found() {
    let store = memory_store().await;
    let result = store.append_log(uuid::Uuid::new_v4(), "line".to_string()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_rejected_update_leaves_row_unchanged() {
    let store = memory_store().await;
    let job = store.create(NewJob::queued("seed".to_string())).await.unwrap();
    store.update_partial(job.id, JobUpdate::checkpoint(50, "Generating PIF")).await.unwrap();

    let backwards = store.update_partial(job.id, JobUpdate::checkpoint(30, "Deriving")).await;
    assert!(matches!(backwards, Err(Error::InvalidTransition(_))));

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.progress, 50);
    assert_eq!(stored.current_step, "Generating PIF");
    assert_eq!(stored.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_terminal_job_rejects_state_changes() {
    let store = memory_store().await;
    let job = store.create(NewJob::queued("seed".to_string())).await.unwrap();
    store.update_partial(job.id, JobUpdate::failed("boom")).await.unwrap();

    let result = store.update_partial(job.id, JobUpdate::checkpoint(10, "Parsing")).await;
    assert!(matches!(result, Err(Error::InvalidTransition(_))));

    // Logs may still grow
    let job = store.append_log(job.id, "late line".to_string()).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("boom"));
    assert_eq!(job.logs.last().map(String::as_str), Some("late line"));
}

#[tokio::test]
async fn test_list_unfinished_skips_terminal_jobs() {
    let store = memory_store().await;
    let pending = store.create(NewJob::queued("a".to_string())).await.unwrap();
    let processing = store.create(NewJob::queued("b".to_string())).await.unwrap();
    let failed = store.create(NewJob::queued("c".to_string())).await.unwrap();

    store
        .update_partial(processing.id, JobUpdate::checkpoint(10, "Parsing"))
        .await
        .unwrap();
    store.update_partial(failed.id, JobUpdate::failed("boom")).await.unwrap();

    let mut unfinished = store.list_unfinished().await.unwrap();
    unfinished.sort();
    let mut expected = vec![pending.id, processing.id];
    expected.sort();
    assert_eq!(unfinished, expected);
}

#[tokio::test]
async fn test_full_run_on_sqlite() {
    let store = memory_store().await;
    let orch = JobOrchestrator::new(Arc::new(store.clone()), EventBus::new(1024), fast_settings());

    let job = orch.submit(sample_inputs()).await.unwrap();
    let done = wait_for_terminal(&orch, job.id).await;

    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 100);

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.logs, done.logs);
    assert!(stored.logs.len() > 10);
    assert!(orch.download(job.id).await.is_ok());
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("adn.db");

    let id = {
        let pool = init_database_pool(&db_path).await.unwrap();
        let store = SqliteJobStore::new(pool.clone());
        let job = store.create(NewJob::queued("seed".to_string())).await.unwrap();
        pool.close().await;
        job.id
    };

    assert!(db_path.exists());

    let pool = init_database_pool(&db_path).await.unwrap();
    let store = SqliteJobStore::new(pool.clone());
    let orch = JobOrchestrator::new(Arc::new(store.clone()), EventBus::new(16), fast_settings());

    assert_eq!(orch.recover_interrupted().await.unwrap(), 1);
    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_on_file_database_all_complete() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database_pool(&dir.path().join("adn.db")).await.unwrap();
    let store = SqliteJobStore::new(pool.clone());
    let orch = JobOrchestrator::new(Arc::new(store.clone()), EventBus::new(4096), fast_settings());

    let mut join_set = JoinSet::new();
    for i in 0..16 {
        let orch = orch.clone();
        join_set.spawn(async move {
            let inputs = vec![adn_conv::models::SequenceInput::new(
                format!("batch_{}.adn", i),
                "ACGTN".repeat(i + 1),
            )];
            orch.submit(inputs).await.expect("submit").id
        });
    }

    let mut ids = Vec::new();
    while let Some(result) = join_set.join_next().await {
        ids.push(result.expect("submit task panicked"));
    }
    assert_eq!(ids.len(), 16);

    for id in &ids {
        let done = wait_for_terminal_within(&orch, *id, std::time::Duration::from_secs(30)).await;
        assert_eq!(done.status, JobStatus::Completed, "job {} failed: {:?}", id, done.error);
        assert!(orch.download(*id).await.is_ok());
    }

    assert!(store.list_unfinished().await.unwrap().is_empty());
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_to_one_job_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database_pool(&dir.path().join("adn.db")).await.unwrap();
    let store = SqliteJobStore::new(pool.clone());
    let job = store.create(NewJob::queued("seed".to_string())).await.unwrap();

    let mut join_set = JoinSet::new();
    for i in 0..20 {
        let store = store.clone();
        join_set.spawn(async move {
            if i % 2 == 0 {
                store.append_log(job.id, format!("line {}", i)).await.map(|_| ())
            } else {
                store
                    .update_partial(job.id, JobUpdate::checkpoint(10, "Parsing ADN Files"))
                    .await
                    .map(|_| ())
            }
        });
    }
    while let Some(result) = join_set.join_next().await {
        result.expect("task panicked").expect("write succeeded");
    }

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.logs.len(), 11);
    assert_eq!(stored.logs[0], "seed");
    assert_eq!(stored.status, JobStatus::Processing);
    pool.close().await;
}
