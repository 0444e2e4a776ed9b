//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.client().query(ENROLLMENT_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Enrollment table schema.
///
/// Timestamps are stored as RFC 3339 strings, matching how the records are
/// serialized on the Rust side.
const ENROLLMENT_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS enrollment SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS name ON enrollment TYPE string;
DEFINE FIELD IF NOT EXISTS email ON enrollment TYPE string;
DEFINE FIELD IF NOT EXISTS age ON enrollment TYPE int ASSERT $value >= 0 AND $value <= 120;
DEFINE FIELD IF NOT EXISTS age_group_id ON enrollment TYPE string;
DEFINE FIELD IF NOT EXISTS status ON enrollment TYPE string DEFAULT "pending"
    ASSERT $value IN ["pending", "approved", "rejected"];
DEFINE FIELD IF NOT EXISTS created_at ON enrollment TYPE string;
DEFINE FIELD IF NOT EXISTS processed_at ON enrollment TYPE option<string>;

-- The worker only ever looks for pending enrollments
DEFINE INDEX IF NOT EXISTS enrollment_status ON enrollment FIELDS status;
DEFINE INDEX IF NOT EXISTS enrollment_age_group ON enrollment FIELDS age_group_id;
"#;
