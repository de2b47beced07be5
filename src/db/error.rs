use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not configured")]
    NotConfigured,

    #[error("Validation error: {0}")]
    Validation(String),

    /// A tag insert lost a race against a concurrent insert of the same name.
    #[error("Tag '{0}' already exists")]
    DuplicateTagName(String),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Map a tag insert failure, turning a unique-name violation into
/// [`DbError::DuplicateTagName`].
#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
pub(crate) fn map_tag_insert_error(err: sqlx::Error, name: &str) -> DbError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::DuplicateTagName(name.to_string())
        }
        _ => map_write_error(err),
    }
}

/// Map a failed write, surfacing CHECK constraint violations as validation errors.
#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
pub(crate) fn map_write_error(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            DbError::Validation(db_err.message().to_string())
        }
        _ => DbError::from(err),
    }
}
