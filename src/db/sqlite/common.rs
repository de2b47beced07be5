use sqlx::{
    query::Query,
    sqlite::{Sqlite, SqliteArguments},
};
use uuid::Uuid;

use crate::db::{
    error::{DbError, DbResult},
    search::SqlValue,
};

/// Parse a UUID string from the database, returning a DbError on failure
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

/// `?, ?, ...` for an IN list of `n` values.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Bind filter values in order. UUIDs are stored as TEXT.
pub fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &[SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Uuid(id) => query.bind(id.to_string()),
        };
    }
    query
}
