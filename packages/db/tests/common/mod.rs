use db::{Database, DbConfig, DbError, EnrollmentRepository};
use pipeline_core::{Enrollment, EnrollmentId, NewEnrollment};

/// Fresh in-memory database with the schema applied.
///
/// Every `mem://` connection is its own datastore, so tests do not share state.
pub async fn setup_db() -> Result<Database, DbError> {
    db::connect(&DbConfig::memory()).await
}

pub async fn setup_repo() -> Result<EnrollmentRepository, DbError> {
    Ok(EnrollmentRepository::new(setup_db().await?))
}

pub fn new_enrollment(name: &str) -> NewEnrollment {
    NewEnrollment::new(name, format!("{}@example.com", name.to_lowercase()), 34, "AG-30-39")
}

/// Insert a pending enrollment under a fixed id.
pub async fn seed(repo: &EnrollmentRepository, id: &str) -> Result<Enrollment, DbError> {
    repo.insert(&new_enrollment("Ada").into_enrollment(EnrollmentId::from(id)))
        .await
}
