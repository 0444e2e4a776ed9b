//! One polling iteration: dequeue, resolve, decide, commit.

use std::sync::Arc;

use chrono::Utc;
use db::{DbError, EnrollmentStore, StoreSession};
use pipeline_core::{EnrollmentId, EnrollmentJob, SkipReason, WorkerEvent};
use queue::{QueueBackend, QueueError};
use tokio::sync::broadcast;

use crate::rules::StatusRule;

/// Errors that abandon an iteration.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// What happened to the jobs of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Payloads removed from the queue.
    pub dequeued: usize,
    /// Enrollments finalized and committed.
    pub processed: usize,
    /// Payloads without a usable enrollment id.
    pub malformed: usize,
    /// Jobs whose enrollment does not exist.
    pub missing: usize,
    /// Jobs whose enrollment already left the pending status.
    pub stale: usize,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.dequeued == 0
    }

    pub fn skipped(&self) -> usize {
        self.malformed + self.missing + self.stale
    }
}

/// Drives a single iteration of the enrollment pipeline.
pub struct BatchProcessor<Q, S, R> {
    queue: Arc<Q>,
    store: S,
    rule: R,
    batch_size: usize,
    event_tx: Option<broadcast::Sender<WorkerEvent>>,
}

impl<Q, S, R> BatchProcessor<Q, S, R>
where
    Q: QueueBackend,
    S: EnrollmentStore,
    R: StatusRule,
{
    pub fn new(queue: Arc<Q>, store: S, rule: R, batch_size: usize) -> Self {
        Self {
            queue,
            store,
            rule,
            batch_size,
            event_tx: None,
        }
    }

    /// Set the event broadcaster.
    pub fn with_event_tx(mut self, tx: broadcast::Sender<WorkerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run one full iteration against the queue and the store.
    ///
    /// An empty queue yields an empty outcome, not an error. Any queue or
    /// store failure abandons the batch and nothing it staged is persisted.
    pub async fn process_batch(&self) -> Result<BatchOutcome, WorkerError> {
        let payloads = self.dequeue().await?;
        self.process(payloads).await
    }

    /// Pull up to `batch_size` payloads off the queue.
    pub async fn dequeue(&self) -> Result<Vec<serde_json::Value>, WorkerError> {
        Ok(self.queue.dequeue_batch(self.batch_size).await?)
    }

    /// Resolve, decide and commit an already dequeued batch, in order.
    pub async fn process(
        &self,
        payloads: Vec<serde_json::Value>,
    ) -> Result<BatchOutcome, WorkerError> {
        let mut outcome = BatchOutcome {
            dequeued: payloads.len(),
            ..Default::default()
        };
        if payloads.is_empty() {
            return Ok(outcome);
        }

        let mut session = self.store.begin().await?;

        for payload in &payloads {
            let job = match EnrollmentJob::from_payload(payload) {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed job");
                    outcome.malformed += 1;
                    self.skipped(None, SkipReason::Malformed);
                    continue;
                }
            };
            let id = job.enrollment_id;

            let Some(mut enrollment) = session.fetch(&id).await? else {
                tracing::warn!(enrollment_id = %id, "Enrollment not found, dropping job");
                outcome.missing += 1;
                self.skipped(Some(id), SkipReason::Missing);
                continue;
            };

            if !enrollment.status.is_initial() {
                tracing::debug!(
                    enrollment_id = %id,
                    status = %enrollment.status,
                    "Enrollment already processed, skipping"
                );
                outcome.stale += 1;
                self.skipped(Some(id), SkipReason::Stale);
                continue;
            }

            let status = self.rule.evaluate(&enrollment);
            enrollment.finalize(status, Utc::now());
            tracing::debug!(enrollment_id = %id, status = %status, "Staged enrollment");
            session.stage(enrollment);
        }

        if !session.staged().is_empty() {
            outcome.processed = session.commit().await?;
        }

        tracing::info!(
            count = outcome.processed,
            dequeued = outcome.dequeued,
            skipped = outcome.skipped(),
            "Processed enrollment batch"
        );

        Ok(outcome)
    }

    fn skipped(&self, enrollment_id: Option<EnrollmentId>, reason: SkipReason) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(WorkerEvent::JobSkipped {
                enrollment_id,
                reason,
                timestamp: Utc::now(),
            });
        }
    }
}
