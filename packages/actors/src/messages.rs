//! Message types for actor communication.

use pipeline_core::WorkerPhase;
use ractor::RpcReplyPort;

/// Messages for the enrollment worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run one polling iteration.
    Poll,

    /// Stop after the current message. Never interrupts a batch.
    Shutdown,

    /// Get the current lifecycle phase.
    GetPhase { reply: RpcReplyPort<WorkerPhase> },
}
