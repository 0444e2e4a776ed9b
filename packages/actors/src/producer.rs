//! Entry point that feeds new enrollments into the pipeline.

use std::sync::Arc;

use db::{DbError, EnrollmentRepository};
use pipeline_core::{Enrollment, EnrollmentJob, NewEnrollment};
use queue::{QueueBackend, QueueError};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("failed to create enrollment: {0}")]
    Store(#[from] DbError),

    /// The record exists but was never queued; it stays pending.
    #[error("enrollment {enrollment_id} created but not queued: {source}")]
    Enqueue {
        enrollment_id: String,
        #[source]
        source: QueueError,
    },
}

/// Creates pending enrollments and queues them for the worker.
pub struct EnrollmentProducer<Q> {
    repo: EnrollmentRepository,
    queue: Arc<Q>,
}

impl<Q: QueueBackend> EnrollmentProducer<Q> {
    pub fn new(repo: EnrollmentRepository, queue: Arc<Q>) -> Self {
        Self { repo, queue }
    }

    /// Persist the enrollment as pending, then queue a job referencing it.
    ///
    /// The job is only enqueued once the record exists.
    pub async fn submit(&self, new: NewEnrollment) -> Result<Enrollment, SubmitError> {
        let enrollment = self.repo.create(new).await?;

        self.queue
            .enqueue(&EnrollmentJob::new(enrollment.id.clone()))
            .await
            .map_err(|source| SubmitError::Enqueue {
                enrollment_id: enrollment.id.to_string(),
                source,
            })?;

        tracing::info!(enrollment_id = %enrollment.id, "Enrollment submitted");
        Ok(enrollment)
    }
}
