//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A stored value could not be mapped to a domain type
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl DbError {
    /// Map a sqlx error, turning unique violations into [`DbError::Conflict`]
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(
                    db_err
                        .constraint()
                        .unwrap_or("unique constraint")
                        .to_string(),
                );
            }
        }
        Self::Sqlx(err)
    }
}

/// Result alias for database operations
pub type DbResult<T> = Result<T, DbError>;
