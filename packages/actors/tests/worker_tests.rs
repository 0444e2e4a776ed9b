#![allow(clippy::disallowed_methods)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use actors::{ApproveAll, WorkerArgs, WorkerMessage, WorkerSettings, start_worker};
use common::{FailingStore, SlowStore, TestResult};
use pipeline_core::{EnrollmentStatus, WorkerEvent, WorkerPhase};
use queue::RedisQueue;
use tokio::sync::broadcast;

fn fast_settings() -> WorkerSettings {
    WorkerSettings::default()
        .with_batch_size(10)
        .with_idle_backoff(Duration::from_millis(50))
        .with_error_backoff(Duration::from_millis(50))
}

#[tokio::test]
async fn test_worker_drains_queue() -> TestResult {
    let p = common::setup().await?;
    for id in ["E1", "E2", "E3"] {
        common::seed(&p.repo, id, EnrollmentStatus::Pending).await?;
        common::enqueue(&p.queue, id).await?;
    }

    let (tx, mut rx) = broadcast::channel(64);
    let args = WorkerArgs::new(p.queue.clone(), p.repo.clone(), ApproveAll)
        .with_settings(fast_settings())
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    let event = common::wait_for(&mut rx, |e| matches!(e, WorkerEvent::BatchProcessed { .. }))
        .await?;
    assert!(matches!(
        event,
        WorkerEvent::BatchProcessed { processed: 3, .. }
    ));
    for id in ["E1", "E2", "E3"] {
        assert_eq!(
            common::fetch(&p.repo, id).await?.status,
            EnrollmentStatus::Approved
        );
    }

    worker.send_message(WorkerMessage::Shutdown)?;
    handle.await?;

    Ok(())
}

#[tokio::test]
async fn test_worker_picks_up_late_jobs() -> TestResult {
    let p = common::setup().await?;
    let (tx, mut rx) = broadcast::channel(64);
    let args = WorkerArgs::new(p.queue.clone(), p.repo.clone(), ApproveAll)
        .with_settings(fast_settings())
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    // Let it find the queue empty at least once
    assert_eq!(common::phase(&worker).await?, WorkerPhase::Idle);

    common::seed(&p.repo, "E1", EnrollmentStatus::Pending).await?;
    common::enqueue(&p.queue, "E1").await?;

    common::wait_for(&mut rx, |e| matches!(e, WorkerEvent::BatchProcessed { .. })).await?;
    assert_eq!(
        common::fetch(&p.repo, "E1").await?.status,
        EnrollmentStatus::Approved
    );

    worker.send_message(WorkerMessage::Shutdown)?;
    handle.await?;

    Ok(())
}

#[tokio::test]
async fn test_idle_shutdown_does_not_wait_for_backoff() -> TestResult {
    let p = common::setup().await?;
    let (tx, mut rx) = broadcast::channel(64);
    let settings = fast_settings().with_idle_backoff(Duration::from_secs(30));
    let args = WorkerArgs::new(p.queue.clone(), p.repo.clone(), ApproveAll)
        .with_settings(settings)
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    assert_eq!(common::phase(&worker).await?, WorkerPhase::Idle);

    worker.send_message(WorkerMessage::Shutdown)?;
    tokio::time::timeout(Duration::from_secs(2), handle).await??;

    common::wait_for(&mut rx, |e| matches!(e, WorkerEvent::Stopped { .. })).await?;

    Ok(())
}

#[tokio::test]
async fn test_shutdown_waits_for_batch_commit() -> TestResult {
    let p = common::setup().await?;
    common::seed(&p.repo, "E1", EnrollmentStatus::Pending).await?;
    common::enqueue(&p.queue, "E1").await?;

    let store = SlowStore {
        inner: p.repo.clone(),
        delay: Duration::from_millis(300),
    };
    let (tx, mut rx) = broadcast::channel(64);
    let args = WorkerArgs::new(p.queue.clone(), store, ApproveAll)
        .with_settings(fast_settings())
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    // Queued behind the first poll, which is already mid-batch
    worker.send_message(WorkerMessage::Shutdown)?;
    tokio::time::timeout(Duration::from_secs(5), handle).await??;

    assert_eq!(
        common::fetch(&p.repo, "E1").await?.status,
        EnrollmentStatus::Approved
    );

    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            WorkerEvent::BatchProcessed { processed, .. } => assert_eq!(processed, 1),
            WorkerEvent::PhaseChanged { new_phase, .. } => phases.push(new_phase),
            _ => {}
        }
    }
    assert_eq!(
        phases,
        vec![
            WorkerPhase::Processing,
            WorkerPhase::Idle,
            WorkerPhase::ShuttingDown,
            WorkerPhase::Stopped,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_failed_iteration_is_not_fatal() -> TestResult {
    let p = common::setup().await?;
    common::seed(&p.repo, "E1", EnrollmentStatus::Pending).await?;
    common::enqueue(&p.queue, "E1").await?;

    let store = FailingStore {
        inner: p.repo.clone(),
    };
    let (tx, mut rx) = broadcast::channel(64);
    let args = WorkerArgs::new(p.queue.clone(), store, ApproveAll)
        .with_settings(fast_settings())
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    common::wait_for(&mut rx, |e| matches!(e, WorkerEvent::IterationFailed { .. })).await?;

    // Still alive and polling
    assert_eq!(common::phase(&worker).await?, WorkerPhase::Idle);
    assert_eq!(
        common::fetch(&p.repo, "E1").await?.status,
        EnrollmentStatus::Pending
    );

    worker.send_message(WorkerMessage::Shutdown)?;
    handle.await?;

    Ok(())
}

#[tokio::test]
async fn test_unreachable_queue_keeps_retrying() -> TestResult {
    let p = common::setup().await?;
    let queue = Arc::new(
        RedisQueue::new("redis://127.0.0.1:1/0", "enrollment_queue")?
            .with_connect_timeout(Duration::from_millis(100)),
    );

    let (tx, mut rx) = broadcast::channel(64);
    let args = WorkerArgs::new(queue, p.repo.clone(), ApproveAll)
        .with_settings(fast_settings())
        .with_event_tx(tx);
    let (worker, handle) = start_worker(args).await?;

    for _ in 0..2 {
        common::wait_for(&mut rx, |e| matches!(e, WorkerEvent::IterationFailed { .. })).await?;
    }

    worker.send_message(WorkerMessage::Shutdown)?;
    tokio::time::timeout(Duration::from_secs(2), handle).await??;

    Ok(())
}
