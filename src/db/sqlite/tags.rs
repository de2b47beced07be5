use std::collections::BTreeSet;

use sqlx::{Connection, Row, SqliteConnection};
use uuid::Uuid;

use super::common::{parse_uuid, placeholders};
use crate::{
    db::error::{DbError, DbResult, map_tag_insert_error},
    models::Tag,
};

fn parse_tag(row: &sqlx::sqlite::SqliteRow) -> DbResult<Tag> {
    Ok(Tag {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        name: row.get("name"),
    })
}

/// Look up tags by exact name.
pub(crate) async fn fetch_by_names(
    conn: &mut SqliteConnection,
    names: &BTreeSet<&str>,
) -> DbResult<Vec<Tag>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "SELECT id, name FROM tags WHERE name IN ({})",
        placeholders(names.len())
    );
    let mut query_builder = sqlx::query(&query);
    for name in names {
        query_builder = query_builder.bind(*name);
    }

    let rows = query_builder.fetch_all(&mut *conn).await?;
    rows.iter().map(parse_tag).collect()
}

async fn fetch_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<Tag>> {
    let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(parse_tag).transpose()
}

/// Insert a tag inside a savepoint so a unique violation leaves the
/// enclosing transaction usable.
async fn insert_tag(conn: &mut SqliteConnection, name: &str) -> DbResult<Tag> {
    let id = Uuid::new_v4();

    let mut savepoint = conn.begin().await?;
    sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?)")
        .bind(id.to_string())
        .bind(name)
        .execute(&mut *savepoint)
        .await
        .map_err(|e| map_tag_insert_error(e, name))?;
    savepoint.commit().await?;

    Ok(Tag {
        id,
        name: name.to_string(),
    })
}

/// Insert a tag, falling back to the existing row if another writer created
/// the same name first.
async fn insert_or_fetch(conn: &mut SqliteConnection, name: &str) -> DbResult<Tag> {
    match insert_tag(conn, name).await {
        Ok(tag) => Ok(tag),
        Err(DbError::DuplicateTagName(name)) => {
            tracing::debug!(tag = %name, "Tag created concurrently, re-fetching");
            let existing = fetch_by_name(conn, &name).await?;
            existing.ok_or(DbError::DuplicateTagName(name))
        }
        Err(e) => Err(e),
    }
}

/// Get or create tags for every distinct name, on a connection that is
/// already inside a transaction.
pub(crate) async fn resolve_tags(
    conn: &mut SqliteConnection,
    names: &[String],
) -> DbResult<Vec<Tag>> {
    let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let mut tags = fetch_by_names(conn, &wanted).await?;
    let found: BTreeSet<String> = tags.iter().map(|t| t.name.clone()).collect();

    for name in wanted.iter().filter(|n| !found.contains(**n)) {
        tags.push(insert_or_fetch(conn, name).await?);
    }

    Ok(tags)
}
