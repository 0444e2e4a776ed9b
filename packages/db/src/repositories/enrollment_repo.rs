//! Enrollment repository and its unit-of-work session.

use chrono::{DateTime, Utc};
use pipeline_core::{Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::store::{EnrollmentStore, StoreSession, stage_into};
use crate::{Database, DbError};

const TABLE: &str = "enrollment";

/// Guarded transition for the staged enrollment at `index`. Only lands if
/// the enrollment is still pending when the transaction runs, and returns
/// the row only when it did.
fn transition_statement(index: usize) -> String {
    format!(
        "UPDATE type::thing(\"enrollment\", $id{index}) \
         SET status = $status{index}, processed_at = $processed_at{index} \
         WHERE status = \"pending\" RETURN AFTER;\n"
    )
}

/// Repository for enrollment persistence operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Database,
}

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct EnrollmentRecord {
    id: Thing,
    name: String,
    email: String,
    age: u8,
    age_group_id: String,
    status: EnrollmentStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    processed_at: Option<DateTime<Utc>>,
}

impl EnrollmentRecord {
    fn into_enrollment(self) -> Enrollment {
        Enrollment {
            id: EnrollmentId::from(self.id.id.to_raw()),
            name: self.name,
            email: self.email,
            age: self.age,
            age_group_id: self.age_group_id,
            status: self.status,
            created_at: self.created_at,
            processed_at: self.processed_at,
        }
    }
}

/// Record body for creation - the id lives in the record key, not the content.
#[derive(Debug, Clone, Serialize)]
struct EnrollmentCreate {
    name: String,
    email: String,
    age: u8,
    age_group_id: String,
    status: EnrollmentStatus,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentCreate {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            name: enrollment.name.clone(),
            email: enrollment.email.clone(),
            age: enrollment.age,
            age_group_id: enrollment.age_group_id.clone(),
            status: enrollment.status,
            created_at: enrollment.created_at,
            processed_at: enrollment.processed_at,
        }
    }
}

impl EnrollmentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a pending enrollment under a freshly minted id.
    pub async fn create(&self, new: NewEnrollment) -> Result<Enrollment, DbError> {
        self.insert(&new.into_enrollment(EnrollmentId::new())).await
    }

    /// Insert an enrollment under its own id.
    pub async fn insert(&self, enrollment: &Enrollment) -> Result<Enrollment, DbError> {
        let record: Option<EnrollmentRecord> = self
            .db
            .client()
            .create((TABLE, enrollment.id.to_string()))
            .content(EnrollmentCreate::from(enrollment))
            .await?;

        record
            .map(EnrollmentRecord::into_enrollment)
            .ok_or_else(|| DbError::Query("Failed to create enrollment".into()))
    }

    /// Get an enrollment by ID.
    pub async fn get(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, DbError> {
        let record: Option<EnrollmentRecord> =
            self.db.client().select((TABLE, id.to_string())).await?;

        Ok(record.map(EnrollmentRecord::into_enrollment))
    }

    /// List enrollments with the given status, oldest first.
    pub async fn list_by_status(
        &self,
        status: EnrollmentStatus,
    ) -> Result<Vec<Enrollment>, DbError> {
        let mut result = self
            .db
            .client()
            .query("SELECT * FROM enrollment WHERE status = $status ORDER BY created_at ASC")
            .bind(("status", status))
            .await?;

        let records: Vec<EnrollmentRecord> = result.take(0)?;

        Ok(records
            .into_iter()
            .map(EnrollmentRecord::into_enrollment)
            .collect())
    }

    /// Set an enrollment's status directly, outside the worker pipeline.
    pub async fn update_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, DbError> {
        let mut result = self
            .db
            .client()
            .query("UPDATE type::thing('enrollment', $id) SET status = $status RETURN AFTER")
            .bind(("id", id.to_string()))
            .bind(("status", status))
            .await?;

        let records: Vec<EnrollmentRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(EnrollmentRecord::into_enrollment)
            .ok_or_else(|| DbError::NotFound(format!("Enrollment not found: {}", id)))
    }

    /// Delete an enrollment.
    pub async fn delete(&self, id: &EnrollmentId) -> Result<(), DbError> {
        let _: Option<EnrollmentRecord> = self.db.client().delete((TABLE, id.to_string())).await?;

        Ok(())
    }

    /// Check the underlying connection.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.db.ping().await
    }
}

/// Unit of work over [`EnrollmentRepository`].
pub struct EnrollmentSession {
    repo: EnrollmentRepository,
    staged: Vec<Enrollment>,
}

impl EnrollmentStore for EnrollmentRepository {
    type Session = EnrollmentSession;

    async fn begin(&self) -> Result<EnrollmentSession, DbError> {
        Ok(EnrollmentSession {
            repo: self.clone(),
            staged: Vec::new(),
        })
    }
}

impl StoreSession for EnrollmentSession {
    async fn fetch(&mut self, id: &EnrollmentId) -> Result<Option<Enrollment>, DbError> {
        if let Some(staged) = self.staged.iter().find(|e| &e.id == id) {
            return Ok(Some(staged.clone()));
        }
        self.repo.get(id).await
    }

    fn stage(&mut self, enrollment: Enrollment) {
        stage_into(&mut self.staged, enrollment);
    }

    fn staged(&self) -> &[Enrollment] {
        &self.staged
    }

    async fn commit(self) -> Result<usize, DbError> {
        if self.staged.is_empty() {
            return Ok(0);
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for index in 0..self.staged.len() {
            sql.push_str(&transition_statement(index));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = self.repo.db.client().query(sql);
        for (index, enrollment) in self.staged.iter().enumerate() {
            query = query
                .bind((format!("id{index}"), enrollment.id.to_string()))
                .bind((format!("status{index}"), enrollment.status))
                .bind((format!("processed_at{index}"), enrollment.processed_at));
        }
        let mut response = query.await?.check()?;

        // Transaction boundaries produce no results; one per UPDATE remains
        let mut landed = 0;
        for index in 0..self.staged.len() {
            let updated: Vec<EnrollmentRecord> = response.take(index)?;
            landed += updated.len();
        }

        if landed < self.staged.len() {
            tracing::warn!(
                staged = self.staged.len(),
                count = landed,
                "Some enrollments were finalized elsewhere before commit"
            );
        }
        tracing::debug!(count = landed, "Committed enrollment transitions");
        Ok(landed)
    }
}
