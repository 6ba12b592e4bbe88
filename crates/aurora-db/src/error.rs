//! Database-specific error types and conversions.

use aurora_core::error::AuroraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("query failed: {0}")]
    Query(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for AuroraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AuroraError::NotFound { entity, id },
            other => AuroraError::Database(other.to_string()),
        }
    }
}
