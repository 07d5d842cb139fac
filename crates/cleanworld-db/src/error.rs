//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Unique/primary-key violations become `Duplicate` so a concurrent
/// insert that slips past an existence pre-check still surfaces as a
/// conflict rather than a generic database failure.
impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return DbError::Duplicate(db_err.message().to_string());
        }
        DbError::Connection(e)
    }
}
