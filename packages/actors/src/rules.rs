//! Status rules decide what a pending enrollment becomes.

use pipeline_core::{Enrollment, EnrollmentStatus};

/// Decides the final status of a pending enrollment.
///
/// Implementations must be pure and total: no I/O, no clock reads, and a
/// valid status for every enrollment they are given.
pub trait StatusRule: Send + Sync + 'static {
    /// Evaluate the enrollment and return the status it should move to.
    fn evaluate(&self, enrollment: &Enrollment) -> EnrollmentStatus;
}

/// Approves every enrollment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAll;

impl StatusRule for ApproveAll {
    fn evaluate(&self, _enrollment: &Enrollment) -> EnrollmentStatus {
        EnrollmentStatus::Approved
    }
}

/// A simple function-based rule.
pub struct FnRule<F>
where
    F: Fn(&Enrollment) -> EnrollmentStatus + Send + Sync + 'static,
{
    rule: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Enrollment) -> EnrollmentStatus + Send + Sync + 'static,
{
    /// Create a new function-based rule.
    pub fn new(rule: F) -> Self {
        Self { rule }
    }
}

impl<F> StatusRule for FnRule<F>
where
    F: Fn(&Enrollment) -> EnrollmentStatus + Send + Sync + 'static,
{
    fn evaluate(&self, enrollment: &Enrollment) -> EnrollmentStatus {
        (self.rule)(enrollment)
    }
}
