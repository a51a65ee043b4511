//! Job orchestrator integration tests
//!
//! Runs the full pipeline against the in-memory store with pacing disabled.

mod helpers;

use std::sync::Arc;

use adn_common::events::{AdnEvent, EventBus};
use adn_common::Error;
use adn_conv::models::{JobStatus, NewJob, SequenceInput};
use adn_conv::services::job_orchestrator::{INTERRUPTED_MESSAGE, QUEUED_LOG_MESSAGE};
use adn_conv::services::{JobOrchestrator, JobStore, MemoryJobStore};
use helpers::*;

fn orchestrator(store: Arc<dyn JobStore>) -> JobOrchestrator {
    JobOrchestrator::new(store, EventBus::new(1024), fast_settings())
}

#[tokio::test]
async fn test_submit_returns_pending_job_with_seed_log() {
    let orch = orchestrator(Arc::new(MemoryJobStore::new()));
    let job = orch.submit(sample_inputs()).await.unwrap();

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.progress, 0);
    assert_eq!(job.current_step, "Queued");
    assert_eq!(job.logs.len(), 1);
    assert!(job.logs[0].ends_with(QUEUED_LOG_MESSAGE));
    assert!(job.logs[0].starts_with('['));

    wait_for_terminal(&orch, job.id).await;
}

#[tokio::test]
async fn test_successful_run_completes_and_serves_package() {
    let orch = orchestrator(Arc::new(MemoryJobStore::new()));
    let job = orch.submit(sample_inputs()).await.unwrap();

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 100);
    assert_eq!(done.current_step, "Completed");
    assert_eq!(done.result_url, Some(format!("/api/jobs/{}/download", job.id)));
    assert!(done.error.is_none());
    assert!(done
        .logs
        .last()
        .is_some_and(|line| line.contains("MISSION ACCOMPLISHED")));
    assert!(done.logs.iter().any(|line| line.contains("PREVIEW GENERATION SKIPPED")));

    let first = orch.download(job.id).await.unwrap();
    let second = orch.download(job.id).await.unwrap();
    assert_eq!(first.archive, second.archive);

    let entries = archive_entries(&first.archive);
    assert!(entries.contains(&"metadata/pif.json".to_string()));
    assert!(entries.contains(&"docs/README.md".to_string()));
    assert!(entries.contains(&"logs/system.log".to_string()));
    assert_eq!(entries.iter().filter(|e| e.starts_with("marketing/")).count(), 10);
    assert!(entries
        .iter()
        .any(|e| e.starts_with("luts/Rembrandt_Light_") && e.ends_with("_log.cube")));
    assert!(!entries.contains(&"assets/preview.png".to_string()));
    assert_eq!(entries.len(), first.entry_count);

    let pif: serde_json::Value =
        serde_json::from_slice(&archive_entry(&first.archive, "metadata/pif.json")).unwrap();
    assert_eq!(pif["metadata"]["job_id"], job.id.to_string());
    assert_eq!(pif["metadata"]["subject"], "Rembrandt");
    assert_eq!(
        pif["metadata"]["preset_id"],
        format!("PRESET_{}", first.integrity_tag.to_uppercase())
    );

    let system_log = String::from_utf8(archive_entry(&first.archive, "logs/system.log")).unwrap();
    assert!(system_log.contains(QUEUED_LOG_MESSAGE));
    assert!(system_log.contains("PACKAGING ASSETS..."));
}

#[tokio::test]
async fn test_observed_history_respects_invariants() {
    let store = RecordingStore::default();
    let orch = orchestrator(Arc::new(store.clone()));
    let job = orch.submit(sample_inputs()).await.unwrap();
    wait_for_terminal(&orch, job.id).await;

    let history = store.snapshots();
    assert!(history.len() > 10);

    for pair in history.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert!(after.progress >= before.progress, "progress went backwards");
        assert!(after.logs.starts_with(&before.logs), "log history rewritten");
        if before.is_terminal() {
            assert_eq!(after.status, before.status, "left terminal state");
        }
    }

    for snapshot in &history {
        assert_eq!(snapshot.progress == 100, snapshot.status == JobStatus::Completed);
        if snapshot.is_terminal() {
            assert!(snapshot.error.is_some() ^ snapshot.result_url.is_some());
        } else {
            assert!(snapshot.error.is_none() && snapshot.result_url.is_none());
        }
    }

    let mut checkpoints: Vec<u8> = history.iter().map(|j| j.progress).collect();
    checkpoints.dedup();
    assert_eq!(checkpoints, vec![0, 10, 30, 50, 70, 90, 100]);
}

#[tokio::test]
async fn test_failing_preview_does_not_fail_job() {
    let orch = orchestrator(Arc::new(MemoryJobStore::new())).with_visual_assets(Arc::new(FailingPreview));
    let job = orch.submit(sample_inputs()).await.unwrap();

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done
        .logs
        .iter()
        .any(|line| line.contains("PREVIEW GENERATION FAILED") && line.contains("503")));

    let package = orch.download(job.id).await.unwrap();
    assert!(!archive_entries(&package.archive).contains(&"assets/preview.png".to_string()));
}

#[tokio::test]
async fn test_generated_preview_is_packaged() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    let orch = orchestrator(Arc::new(MemoryJobStore::new())).with_visual_assets(Arc::new(FixedPreview(png.clone())));
    let job = orch.submit(sample_inputs()).await.unwrap();

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Completed);

    let package = orch.download(job.id).await.unwrap();
    assert_eq!(archive_entry(&package.archive, "assets/preview.png"), png);
}

#[tokio::test]
async fn test_core_stage_failure_marks_job_failed() {
    let store = FailAtProgress {
        inner: MemoryJobStore::new(),
        progress: 70,
    };
    let orch = orchestrator(Arc::new(store));
    let job = orch.submit(sample_inputs()).await.unwrap();

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 50);
    assert_eq!(done.current_step, "Generating PIF");
    assert!(done.result_url.is_none());
    let error = done.error.clone().unwrap();
    assert!(error.starts_with("Compiling Output Formats failed"), "{}", error);
    assert!(done.logs.iter().any(|line| line.contains("PIPELINE HALTED")));

    assert!(matches!(orch.download(job.id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_failed_state_write_is_retried() {
    let store = FlakyFailureWrite::new(70, 2);
    let orch = orchestrator(Arc::new(store.clone()));
    let job = orch.submit(sample_inputs()).await.unwrap();

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.as_deref().unwrap().starts_with("Compiling Output Formats failed"));
    assert!(done.logs.iter().any(|line| line.contains("PIPELINE HALTED")));
    assert_eq!(store.failed_write_attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_submit_fails_job_when_run_cannot_start() {
    let store = UnreadableStore::default();
    let orch = orchestrator(Arc::new(store.clone()));

    let result = orch.submit(sample_inputs()).await;
    assert!(matches!(result, Err(Error::Internal(_))));

    let created = store.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert!(store.inner.list_unfinished().await.unwrap().is_empty());

    let job = store.inner.get(created[0]).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().starts_with("Failed to start conversion"));
    assert!(!orch.is_running(created[0]));
}

#[tokio::test]
async fn test_download_before_completion_is_not_found() {
    let orch = JobOrchestrator::new(
        Arc::new(MemoryJobStore::new()),
        EventBus::new(1024),
        slow_settings(100),
    );
    let job = orch.submit(sample_inputs()).await.unwrap();

    assert!(matches!(orch.download(job.id).await, Err(Error::NotFound(_))));

    let done = wait_for_terminal(&orch, job.id).await;
    assert_eq!(done.status, JobStatus::Completed);
    assert!(orch.download(job.id).await.is_ok());
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let orch = orchestrator(Arc::new(MemoryJobStore::new()));
    let id = uuid::Uuid::new_v4();
    assert!(matches!(orch.status(id).await, Err(Error::NotFound(_))));
    assert!(matches!(orch.download(id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_batches_create_no_job() {
    let store = MemoryJobStore::new();
    let orch = orchestrator(Arc::new(store.clone()));

    assert!(matches!(orch.submit(Vec::new()).await, Err(Error::Validation(_))));
    assert!(matches!(
        orch.submit(vec![SequenceInput::new(" ", "ACGT")]).await,
        Err(Error::Validation(_))
    ));
    assert!(store.list_unfinished().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_at_most_one_run_per_job() {
    let store = MemoryJobStore::new();
    let orch = JobOrchestrator::new(Arc::new(store.clone()), EventBus::new(1024), slow_settings(50));
    let job = store.create(NewJob::queued("seed".to_string())).await.unwrap();

    let handle = orch.start_run(job.id, sample_inputs()).await.unwrap();
    assert!(orch.is_running(job.id));
    assert!(matches!(
        orch.start_run(job.id, sample_inputs()).await,
        Err(Error::InvalidTransition(_))
    ));

    handle.await.unwrap();
    assert!(!orch.is_running(job.id));
    assert_eq!(orch.status(job.id).await.unwrap().status, JobStatus::Completed);

    // Finished jobs are not run again
    assert!(matches!(
        orch.start_run(job.id, sample_inputs()).await,
        Err(Error::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn test_concurrent_jobs_complete_independently() {
    let orch = orchestrator(Arc::new(MemoryJobStore::new()));

    let mut ids = Vec::new();
    for i in 0..5 {
        let inputs = vec![SequenceInput::new(format!("batch_{}.adn", i), "ACGT".repeat(i + 1))];
        ids.push(orch.submit(inputs).await.unwrap().id);
    }

    let mut tags = std::collections::HashSet::new();
    for id in ids {
        let done = wait_for_terminal(&orch, id).await;
        assert_eq!(done.status, JobStatus::Completed);
        tags.insert(orch.download(id).await.unwrap().integrity_tag.clone());
    }
    assert_eq!(tags.len(), 5);
}

#[tokio::test]
async fn test_recover_interrupted_fails_stale_jobs() {
    let store = MemoryJobStore::new();
    let stale = store.create(NewJob::queued("seed".to_string())).await.unwrap();
    let orch = orchestrator(Arc::new(store));

    assert_eq!(orch.recover_interrupted().await.unwrap(), 1);

    let job = orch.status(stale.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert_eq!(orch.recover_interrupted().await.unwrap(), 0);
}

#[tokio::test]
async fn test_events_follow_job_lifecycle() {
    let event_bus = EventBus::new(1024);
    let mut rx = event_bus.subscribe();
    let orch = JobOrchestrator::new(Arc::new(MemoryJobStore::new()), event_bus, fast_settings());

    let job = orch.submit(sample_inputs()).await.unwrap();

    let mut progress = Vec::new();
    let mut first = None;
    loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("event before timeout")
            .expect("bus open");
        assert_eq!(event.job_id(), job.id);
        first.get_or_insert_with(|| event.event_type().to_string());

        match event {
            AdnEvent::JobProgress { progress: p, .. } => progress.push(p),
            AdnEvent::JobCompleted { artifact_count, .. } => {
                assert!(artifact_count >= 17);
                break;
            }
            AdnEvent::JobFailed { error_message, .. } => panic!("job failed: {}", error_message),
            _ => {}
        }
    }

    assert_eq!(first.as_deref(), Some("JobCreated"));
    assert_eq!(progress, vec![0, 10, 30, 50, 70, 90, 100]);
}
