use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use super::{
    common::bind_values,
    tags::{fetch_by_names, resolve_tags},
};
use crate::{
    db::{
        error::{DbResult, map_write_error},
        repos::{PageParams, PageResult, PromptFilter, PromptRepo, truncate_to_millis},
        search::{Dialect, ResolvedFilter, SqlFilter},
    },
    models::{CreatePrompt, Prompt, Tag, UpdatePrompt, sort_tags},
};

const PROMPT_COLUMNS: &str = "p.id, p.title, p.description, p.full_prompt, p.created_at";

pub struct PostgresPromptRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresPromptRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    /// Parse a Prompt from a database row. Tags are attached separately.
    fn parse_prompt(row: &sqlx::postgres::PgRow) -> Prompt {
        Prompt {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            full_prompt: row.get("full_prompt"),
            created_at: row.get("created_at"),
            tags: Vec::new(),
        }
    }
}

async fn attach_tags(conn: &mut PgConnection, prompts: &mut [Prompt]) -> DbResult<()> {
    if prompts.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = prompts.iter().map(|p| p.id).collect();
    let rows = sqlx::query(
        r#"
        SELECT pt.prompt_id, t.id, t.name
        FROM prompt_tags pt
        JOIN tags t ON t.id = pt.tag_id
        WHERE pt.prompt_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_prompt: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        by_prompt
            .entry(row.get("prompt_id"))
            .or_default()
            .push(Tag {
                id: row.get("id"),
                name: row.get("name"),
            });
    }

    for prompt in prompts.iter_mut() {
        let mut tags = by_prompt.remove(&prompt.id).unwrap_or_default();
        sort_tags(&mut tags);
        prompt.tags = tags;
    }
    Ok(())
}

async fn fetch_prompt(conn: &mut PgConnection, id: Uuid) -> DbResult<Option<Prompt>> {
    let query = format!("SELECT {} FROM prompts p WHERE p.id = $1", PROMPT_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut prompts = [PostgresPromptRepo::parse_prompt(&row)];
    attach_tags(conn, &mut prompts).await?;
    let [prompt] = prompts;
    Ok(Some(prompt))
}

async fn link_tags(conn: &mut PgConnection, prompt_id: Uuid, tags: &[Tag]) -> DbResult<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
    sqlx::query(
        r#"
        INSERT INTO prompt_tags (prompt_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS tag_id
        "#,
    )
    .bind(prompt_id)
    .bind(&tag_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl PromptRepo for PostgresPromptRepo {
    async fn create(&self, input: CreatePrompt) -> DbResult<Prompt> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        let mut tx = self.write_pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO prompts (id, title, description, full_prompt, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.full_prompt)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let mut tags = resolve_tags(&mut tx, &input.tags).await?;
        link_tags(&mut tx, id, &tags).await?;

        tx.commit().await?;

        sort_tags(&mut tags);
        Ok(Prompt {
            id,
            title: input.title,
            description: input.description,
            full_prompt: input.full_prompt,
            created_at: now,
            tags,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Prompt>> {
        let mut conn = self.read_pool.acquire().await?;
        fetch_prompt(&mut conn, id).await
    }

    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<Option<Prompt>> {
        let mut tx = self.write_pool.begin().await?;

        // Lock the row so concurrent tag replacements apply one after the other
        let exists = sqlx::query("SELECT 1 FROM prompts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        if input.has_field_changes() {
            let mut set_clauses = Vec::new();
            let mut param_idx = 1;
            if input.title.is_some() {
                set_clauses.push(format!("title = ${}", param_idx));
                param_idx += 1;
            }
            if input.description.is_some() {
                set_clauses.push(format!("description = ${}", param_idx));
                param_idx += 1;
            }
            if input.full_prompt.is_some() {
                set_clauses.push(format!("full_prompt = ${}", param_idx));
                param_idx += 1;
            }

            let query = format!(
                "UPDATE prompts SET {} WHERE id = ${}",
                set_clauses.join(", "),
                param_idx
            );
            let mut query_builder = sqlx::query(&query);

            if let Some(ref title) = input.title {
                query_builder = query_builder.bind(title);
            }
            if let Some(ref description) = input.description {
                query_builder = query_builder.bind(description.as_deref());
            }
            if let Some(ref full_prompt) = input.full_prompt {
                query_builder = query_builder.bind(full_prompt);
            }

            query_builder
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
        }

        if let Some(ref names) = input.tags {
            sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            let tags = resolve_tags(&mut tx, names).await?;
            link_tags(&mut tx, id, &tags).await?;
        }

        let prompt = fetch_prompt(&mut tx, id).await?;
        tx.commit().await?;

        Ok(prompt)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let mut tx = self.write_pool.begin().await?;

        sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, filter: PromptFilter, page: PageParams) -> DbResult<PageResult<Prompt>> {
        let mut conn = self.read_pool.acquire().await?;

        let wanted = filter.tag_names();
        let tags = fetch_by_names(&mut conn, &wanted).await?;
        if tags.len() < wanted.len() {
            // An unknown tag can match nothing
            return Ok(PageResult::empty());
        }

        let resolved = ResolvedFilter {
            tag_ids: tags.iter().map(|t| t.id).collect(),
            text: filter.text(),
        };
        let sql = SqlFilter::build(&resolved, Dialect::Postgres);
        let where_sql = sql.where_sql();

        let count_query = format!("SELECT COUNT(*) as count FROM prompts p {}", where_sql);
        let total: i64 = bind_values(sqlx::query(&count_query), &sql.bindings)
            .fetch_one(&mut *conn)
            .await?
            .get("count");

        if total == 0 {
            return Ok(PageResult::empty());
        }

        let page_query = format!(
            r#"
            SELECT {}
            FROM prompts p
            {}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT {} OFFSET {}
            "#,
            PROMPT_COLUMNS,
            where_sql,
            sql.next_placeholder(0),
            sql.next_placeholder(1)
        );
        let rows = bind_values(sqlx::query(&page_query), &sql.bindings)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&mut *conn)
            .await?;

        let mut items: Vec<Prompt> = rows.iter().map(Self::parse_prompt).collect();
        attach_tags(&mut conn, &mut items).await?;

        Ok(PageResult::new(items, total))
    }
}
