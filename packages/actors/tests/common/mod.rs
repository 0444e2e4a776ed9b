#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use actors::{ActorRef, WorkerMessage};
use chrono::Utc;
use db::{DbConfig, DbError, EnrollmentRepository, EnrollmentSession, EnrollmentStore, StoreSession};
use pipeline_core::{
    Enrollment, EnrollmentId, EnrollmentJob, EnrollmentStatus, NewEnrollment, WorkerEvent,
    WorkerPhase,
};
use queue::{InMemoryQueue, QueueBackend, QueueError};
use ractor::rpc::CallResult;
use tokio::sync::broadcast;

pub type TestResult = Result<(), Box<dyn Error>>;

pub struct Pipeline {
    pub repo: EnrollmentRepository,
    pub queue: Arc<InMemoryQueue>,
}

/// Fresh in-memory database and queue.
pub async fn setup() -> Result<Pipeline, DbError> {
    let db = db::connect(&DbConfig::memory()).await?;
    Ok(Pipeline {
        repo: EnrollmentRepository::new(db),
        queue: Arc::new(InMemoryQueue::new()),
    })
}

/// Insert an enrollment under a fixed id with the given status.
pub async fn seed(
    repo: &EnrollmentRepository,
    id: &str,
    status: EnrollmentStatus,
) -> Result<Enrollment, DbError> {
    let mut enrollment = NewEnrollment::new("Ada", "ada@example.com", 34, "AG-30-39")
        .into_enrollment(EnrollmentId::from(id));
    if !status.is_initial() {
        enrollment.finalize(status, Utc::now());
    }
    repo.insert(&enrollment).await
}

pub async fn enqueue(queue: &InMemoryQueue, id: &str) -> Result<(), QueueError> {
    queue.enqueue(&EnrollmentJob::new(EnrollmentId::from(id))).await
}

pub async fn fetch(repo: &EnrollmentRepository, id: &str) -> Result<Enrollment, DbError> {
    repo.get(&EnrollmentId::from(id))
        .await?
        .ok_or_else(|| DbError::NotFound(id.to_string()))
}

/// Wait for the first event matching `pred`.
pub async fn wait_for<F>(
    rx: &mut broadcast::Receiver<WorkerEvent>,
    pred: F,
) -> Result<WorkerEvent, Box<dyn Error>>
where
    F: Fn(&WorkerEvent) -> bool,
{
    let event = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await?;
            if pred(&event) {
                return Ok::<_, broadcast::error::RecvError>(event);
            }
        }
    })
    .await??;
    Ok(event)
}

pub async fn phase(worker: &ActorRef<WorkerMessage>) -> Result<WorkerPhase, Box<dyn Error>> {
    let result = worker
        .call(
            |reply| WorkerMessage::GetPhase { reply },
            Some(Duration::from_secs(1)),
        )
        .await?;
    match result {
        CallResult::Success(phase) => Ok(phase),
        _ => Err("phase query failed".into()),
    }
}

/// Store whose sessions refuse to commit.
pub struct FailingStore {
    pub inner: EnrollmentRepository,
}

pub struct FailingSession {
    inner: EnrollmentSession,
}

impl EnrollmentStore for FailingStore {
    type Session = FailingSession;

    async fn begin(&self) -> Result<FailingSession, DbError> {
        Ok(FailingSession {
            inner: self.inner.begin().await?,
        })
    }
}

impl StoreSession for FailingSession {
    async fn fetch(&mut self, id: &EnrollmentId) -> Result<Option<Enrollment>, DbError> {
        self.inner.fetch(id).await
    }

    fn stage(&mut self, enrollment: Enrollment) {
        self.inner.stage(enrollment);
    }

    fn staged(&self) -> &[Enrollment] {
        self.inner.staged()
    }

    async fn commit(self) -> Result<usize, DbError> {
        Err(DbError::Query("commit rejected".into()))
    }
}

/// Store whose commits take a while to land.
pub struct SlowStore {
    pub inner: EnrollmentRepository,
    pub delay: Duration,
}

pub struct SlowSession {
    inner: EnrollmentSession,
    delay: Duration,
}

impl EnrollmentStore for SlowStore {
    type Session = SlowSession;

    async fn begin(&self) -> Result<SlowSession, DbError> {
        Ok(SlowSession {
            inner: self.inner.begin().await?,
            delay: self.delay,
        })
    }
}

impl StoreSession for SlowSession {
    async fn fetch(&mut self, id: &EnrollmentId) -> Result<Option<Enrollment>, DbError> {
        self.inner.fetch(id).await
    }

    fn stage(&mut self, enrollment: Enrollment) {
        self.inner.stage(enrollment);
    }

    fn staged(&self) -> &[Enrollment] {
        self.inner.staged()
    }

    async fn commit(self) -> Result<usize, DbError> {
        tokio::time::sleep(self.delay).await;
        self.inner.commit().await
    }
}

/// Store where another writer rejects every staged enrollment just before
/// the session commits.
pub struct ContendedStore {
    pub inner: EnrollmentRepository,
}

pub struct ContendedSession {
    repo: EnrollmentRepository,
    inner: EnrollmentSession,
}

impl EnrollmentStore for ContendedStore {
    type Session = ContendedSession;

    async fn begin(&self) -> Result<ContendedSession, DbError> {
        Ok(ContendedSession {
            repo: self.inner.clone(),
            inner: self.inner.begin().await?,
        })
    }
}

impl StoreSession for ContendedSession {
    async fn fetch(&mut self, id: &EnrollmentId) -> Result<Option<Enrollment>, DbError> {
        self.inner.fetch(id).await
    }

    fn stage(&mut self, enrollment: Enrollment) {
        self.inner.stage(enrollment);
    }

    fn staged(&self) -> &[Enrollment] {
        self.inner.staged()
    }

    async fn commit(self) -> Result<usize, DbError> {
        for enrollment in self.inner.staged() {
            self.repo
                .update_status(&enrollment.id, EnrollmentStatus::Rejected)
                .await?;
        }
        self.inner.commit().await
    }
}
