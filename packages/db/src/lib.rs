//! SurrealDB integration for the enrollment pipeline.
//!
//! This crate provides database connectivity, the enrollment repository and
//! the unit-of-work interface the worker commits batches through.

mod connection;
mod schema;
mod store;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError};
pub use repositories::{EnrollmentRepository, EnrollmentSession};
pub use schema::init_schema;
pub use store::{EnrollmentStore, StoreSession};

/// Connect with the given configuration and make sure the schema exists.
pub async fn connect(config: &DbConfig) -> Result<Database, DbError> {
    let db = Database::connect(config).await?;
    init_schema(&db).await?;
    Ok(db)
}
