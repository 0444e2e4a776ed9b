//! Unit-of-work interface the worker uses to read and finalize enrollments.

use std::future::Future;

use pipeline_core::{Enrollment, EnrollmentId};

use crate::DbError;

/// A record store that hands out one session per unit of work.
pub trait EnrollmentStore: Send + Sync + 'static {
    type Session: StoreSession;

    /// Open a session. Dropping it without calling
    /// [`StoreSession::commit`] discards everything staged in it.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, DbError>> + Send;
}

/// Reads enrollments and stages mutations to be committed together.
pub trait StoreSession: Send {
    /// Fetch an enrollment, or `None` if it does not exist.
    ///
    /// A record staged earlier in this session is returned in its staged
    /// form, so a second job for the same enrollment sees the new status.
    fn fetch(
        &mut self,
        id: &EnrollmentId,
    ) -> impl Future<Output = Result<Option<Enrollment>, DbError>> + Send;

    /// Stage an updated enrollment, replacing any earlier staged version.
    fn stage(&mut self, enrollment: Enrollment);

    /// Mutations staged so far, in staging order.
    fn staged(&self) -> &[Enrollment];

    /// Persist all staged mutations atomically: either all become visible
    /// or none do. Returns the number of mutations committed.
    fn commit(self) -> impl Future<Output = Result<usize, DbError>> + Send;
}

/// Replace an earlier staged copy of the same enrollment or append.
pub(crate) fn stage_into(staged: &mut Vec<Enrollment>, enrollment: Enrollment) {
    match staged.iter_mut().find(|e| e.id == enrollment.id) {
        Some(existing) => *existing = enrollment,
        None => staged.push(enrollment),
    }
}
