//! Core domain types for the enrollment pipeline.
//!
//! This crate contains shared types used across all packages:
//! - Enrollment and EnrollmentStatus for the records being finalized
//! - EnrollmentJob for queue payloads
//! - WorkerPhase and WorkerEvent for observing the worker

mod enrollment;
mod events;
mod job;
mod worker;

pub use enrollment::{Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment};
pub use events::{SkipReason, WorkerEvent};
pub use job::{EnrollmentJob, JobDecodeError};
pub use worker::WorkerPhase;
