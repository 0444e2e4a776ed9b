//! Queue payload referencing an enrollment awaiting processing.

use serde::{Deserialize, Serialize};

use crate::EnrollmentId;

/// A queued reference to an enrollment.
///
/// Wire format: `{ "enrollment_id": "<string identifier>" }`. Extra fields
/// are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentJob {
    pub enrollment_id: EnrollmentId,
}

/// Why a queued payload could not be turned into a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobDecodeError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no enrollment_id")]
    MissingId,
    #[error("enrollment_id must be a non-empty string")]
    InvalidId,
}

impl EnrollmentJob {
    pub fn new(enrollment_id: EnrollmentId) -> Self {
        Self { enrollment_id }
    }

    /// Decode a dequeued payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, JobDecodeError> {
        let object = payload.as_object().ok_or(JobDecodeError::NotAnObject)?;
        let id = object
            .get("enrollment_id")
            .filter(|v| !v.is_null())
            .ok_or(JobDecodeError::MissingId)?;

        match id.as_str() {
            Some(id) if !id.trim().is_empty() => Ok(Self::new(EnrollmentId::from(id))),
            _ => Err(JobDecodeError::InvalidId),
        }
    }
}
