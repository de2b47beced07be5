use sqlx::{
    postgres::{PgArguments, Postgres},
    query::Query,
};

use crate::db::search::SqlValue;

/// Bind filter values in placeholder order.
pub fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Uuid(id) => query.bind(*id),
        };
    }
    query
}
