//! Worker lifecycle types.

use serde::{Deserialize, Serialize};

/// Current phase of the enrollment worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    /// No work available, waiting for the next poll.
    #[default]
    Idle,
    /// Draining a batch.
    Processing,
    /// Stop requested, finishing the current unit of work.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl WorkerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerPhase::Stopped)
    }

    /// Whether the worker will still pick up new batches.
    pub fn accepts_work(&self) -> bool {
        matches!(self, WorkerPhase::Idle | WorkerPhase::Processing)
    }
}

impl std::fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerPhase::Idle => write!(f, "idle"),
            WorkerPhase::Processing => write!(f, "processing"),
            WorkerPhase::ShuttingDown => write!(f, "shutting_down"),
            WorkerPhase::Stopped => write!(f, "stopped"),
        }
    }
}
