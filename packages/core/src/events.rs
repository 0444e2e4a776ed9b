//! Event types for observing the worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EnrollmentId, WorkerPhase};

/// Why a dequeued job produced no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Payload did not carry a usable enrollment id.
    Malformed,
    /// The referenced enrollment does not exist (yet, or anymore).
    Missing,
    /// The enrollment already left the pending status.
    Stale,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Malformed => write!(f, "malformed"),
            SkipReason::Missing => write!(f, "missing"),
            SkipReason::Stale => write!(f, "stale"),
        }
    }
}

/// Events emitted by the enrollment worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// The worker started polling.
    Started {
        batch_size: usize,
        timestamp: DateTime<Utc>,
    },
    /// The worker moved between phases.
    PhaseChanged {
        old_phase: WorkerPhase,
        new_phase: WorkerPhase,
        timestamp: DateTime<Utc>,
    },
    /// A non-empty batch was handled and committed.
    BatchProcessed {
        dequeued: usize,
        processed: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },
    /// A job was dropped without a mutation.
    JobSkipped {
        enrollment_id: Option<EnrollmentId>,
        reason: SkipReason,
        timestamp: DateTime<Utc>,
    },
    /// An iteration was abandoned.
    IterationFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The worker reached its terminal phase.
    Stopped { timestamp: DateTime<Utc> },
}

impl WorkerEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            WorkerEvent::Started { timestamp, .. } => *timestamp,
            WorkerEvent::PhaseChanged { timestamp, .. } => *timestamp,
            WorkerEvent::BatchProcessed { timestamp, .. } => *timestamp,
            WorkerEvent::JobSkipped { timestamp, .. } => *timestamp,
            WorkerEvent::IterationFailed { timestamp, .. } => *timestamp,
            WorkerEvent::Stopped { timestamp } => *timestamp,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            WorkerEvent::Started { batch_size, .. } => {
                format!("Worker started (batch size {})", batch_size)
            }
            WorkerEvent::PhaseChanged {
                old_phase,
                new_phase,
                ..
            } => format!("Worker {} -> {}", old_phase, new_phase),
            WorkerEvent::BatchProcessed {
                dequeued,
                processed,
                ..
            } => format!("Batch of {} processed {} enrollments", dequeued, processed),
            WorkerEvent::JobSkipped {
                enrollment_id,
                reason,
                ..
            } => match enrollment_id {
                Some(id) => format!("Job for {} skipped ({})", id, reason),
                None => format!("Job skipped ({})", reason),
            },
            WorkerEvent::IterationFailed { error, .. } => format!("Iteration failed: {}", error),
            WorkerEvent::Stopped { .. } => "Worker stopped".to_string(),
        }
    }
}
