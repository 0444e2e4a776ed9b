//! Repository implementations for database operations.

mod enrollment_repo;

pub use enrollment_repo::{EnrollmentRepository, EnrollmentSession};
