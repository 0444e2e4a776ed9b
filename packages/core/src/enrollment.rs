//! Enrollment domain types: the records whose status the pipeline finalizes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of an enrollment record.
///
/// Freshly minted identifiers are ULIDs, but any non-empty string coming
/// from the record store or a queued job is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(String);

impl EnrollmentId {
    /// Create a new unique enrollment ID.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for EnrollmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for EnrollmentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EnrollmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an enrollment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Created by the API layer, waiting for the worker.
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EnrollmentStatus {
    /// Only pending enrollments may be transitioned by the worker.
    pub fn is_initial(&self) -> bool {
        matches!(self, EnrollmentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enrollment of a person into an age group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    /// Full name of the enrollee.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Age at enrollment time.
    pub age: u8,
    /// Age group the enrollee applied to.
    pub age_group_id: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    /// Set only when the worker transitions the enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// Apply a status decision, stamping the processing time.
    pub fn finalize(&mut self, status: EnrollmentStatus, processed_at: DateTime<Utc>) {
        self.status = status;
        self.processed_at = Some(processed_at);
    }
}

/// Input for creating an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub age_group_id: String,
}

impl NewEnrollment {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        age: u8,
        age_group_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
            age_group_id: age_group_id.into(),
        }
    }

    /// Build the pending enrollment this input describes.
    pub fn into_enrollment(self, id: EnrollmentId) -> Enrollment {
        Enrollment {
            id,
            name: self.name,
            email: self.email,
            age: self.age,
            age_group_id: self.age_group_id,
            status: EnrollmentStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}
