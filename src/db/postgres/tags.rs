use std::collections::BTreeSet;

use sqlx::{Connection, PgConnection, Row};
use uuid::Uuid;

use crate::{
    db::error::{DbError, DbResult, map_tag_insert_error},
    models::Tag,
};

fn parse_tag(row: &sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}

/// Look up tags by exact name.
pub(crate) async fn fetch_by_names(
    conn: &mut PgConnection,
    names: &BTreeSet<&str>,
) -> DbResult<Vec<Tag>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let rows = sqlx::query("SELECT id, name FROM tags WHERE name = ANY($1)")
        .bind(&names)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(parse_tag).collect())
}

async fn fetch_by_name(conn: &mut PgConnection, name: &str) -> DbResult<Option<Tag>> {
    let row = sqlx::query("SELECT id, name FROM tags WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.as_ref().map(parse_tag))
}

/// Insert a tag inside a savepoint. A failed statement would otherwise abort
/// the enclosing transaction.
async fn insert_tag(conn: &mut PgConnection, name: &str) -> DbResult<Tag> {
    let id = Uuid::new_v4();

    let mut savepoint = conn.begin().await?;
    sqlx::query("INSERT INTO tags (id, name) VALUES ($1, $2)")
        .bind(id)
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

async fn insert_or_fetch(conn: &mut PgConnection, name: &str) -> DbResult<Tag> {
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
pub(crate) async fn resolve_tags(conn: &mut PgConnection, names: &[String]) -> DbResult<Vec<Tag>> {
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
