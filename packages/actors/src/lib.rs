//! Actor system for the enrollment pipeline.
//!
//! This crate provides the Ractor-based worker that turns queued enrollment
//! jobs into finalized records, the rules that decide each outcome and the
//! producer that feeds the queue.
//!
//! # Architecture
//!
//! - `EnrollmentProducer` - Creates pending enrollments and queues a job for each
//! - `EnrollmentWorker` - Polls the queue and commits one batch per iteration
//! - `StatusRule` - Pure decision from enrollment to final status
//!
//! # Usage
//!
//! ```ignore
//! use actors::{ApproveAll, WorkerArgs, WorkerMessage, start_worker};
//!
//! let args = WorkerArgs::new(queue, repo, ApproveAll).with_settings(settings);
//! let (worker, handle) = start_worker(args).await?;
//!
//! // Later, stop between batches and wait for the actor to exit
//! worker.send_message(WorkerMessage::Shutdown)?;
//! handle.await?;
//! ```

mod batch;
mod messages;
mod producer;
mod rules;
mod settings;
mod worker_actor;

pub use batch::{BatchOutcome, BatchProcessor, WorkerError};
pub use messages::WorkerMessage;
pub use producer::{EnrollmentProducer, SubmitError};
pub use rules::{ApproveAll, FnRule, StatusRule};
pub use settings::{
    ConfigError, DEFAULT_BATCH_SIZE, DEFAULT_ERROR_BACKOFF, DEFAULT_IDLE_BACKOFF, WorkerSettings,
};
pub use worker_actor::{EnrollmentWorker, WorkerArgs, WorkerState, start_worker};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
