use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{
    common::{bind_values, parse_uuid, placeholders},
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

pub struct SqlitePromptRepo {
    pool: SqlitePool,
}

impl SqlitePromptRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse a Prompt from a database row. Tags are attached separately.
    fn parse_prompt(row: &sqlx::sqlite::SqliteRow) -> DbResult<Prompt> {
        Ok(Prompt {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            description: row.get("description"),
            full_prompt: row.get("full_prompt"),
            created_at: row.get("created_at"),
            tags: Vec::new(),
        })
    }
}

/// Load the tags of every given prompt, keyed by prompt id.
async fn load_tags(
    conn: &mut SqliteConnection,
    prompt_ids: &[Uuid],
) -> DbResult<HashMap<Uuid, Vec<Tag>>> {
    let mut by_prompt: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    if prompt_ids.is_empty() {
        return Ok(by_prompt);
    }

    let query = format!(
        r#"
        SELECT pt.prompt_id, t.id, t.name
        FROM prompt_tags pt
        JOIN tags t ON t.id = pt.tag_id
        WHERE pt.prompt_id IN ({})
        "#,
        placeholders(prompt_ids.len())
    );
    let mut query_builder = sqlx::query(&query);
    for id in prompt_ids {
        query_builder = query_builder.bind(id.to_string());
    }

    for row in query_builder.fetch_all(&mut *conn).await? {
        let prompt_id = parse_uuid(&row.get::<String, _>("prompt_id"))?;
        by_prompt.entry(prompt_id).or_default().push(Tag {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            name: row.get("name"),
        });
    }

    for tags in by_prompt.values_mut() {
        sort_tags(tags);
    }
    Ok(by_prompt)
}

async fn attach_tags(conn: &mut SqliteConnection, prompts: &mut [Prompt]) -> DbResult<()> {
    let ids: Vec<Uuid> = prompts.iter().map(|p| p.id).collect();
    let mut by_prompt = load_tags(conn, &ids).await?;
    for prompt in prompts.iter_mut() {
        prompt.tags = by_prompt.remove(&prompt.id).unwrap_or_default();
    }
    Ok(())
}

async fn fetch_prompt(conn: &mut SqliteConnection, id: Uuid) -> DbResult<Option<Prompt>> {
    let query = format!("SELECT {} FROM prompts p WHERE p.id = ?", PROMPT_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut prompts = [SqlitePromptRepo::parse_prompt(&row)?];
    attach_tags(conn, &mut prompts).await?;
    let [prompt] = prompts;
    Ok(Some(prompt))
}

async fn link_tags(conn: &mut SqliteConnection, prompt_id: Uuid, tags: &[Tag]) -> DbResult<()> {
    for tag in tags {
        sqlx::query("INSERT INTO prompt_tags (prompt_id, tag_id) VALUES (?, ?)")
            .bind(prompt_id.to_string())
            .bind(tag.id.to_string())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PromptRepo for SqlitePromptRepo {
    async fn create(&self, input: CreatePrompt) -> DbResult<Prompt> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO prompts (id, title, description, full_prompt, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
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
        let mut conn = self.pool.acquire().await?;
        fetch_prompt(&mut conn, id).await
    }

    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<Option<Prompt>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM prompts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        if input.has_field_changes() {
            let mut set_clauses = Vec::new();
            if input.title.is_some() {
                set_clauses.push("title = ?");
            }
            if input.description.is_some() {
                set_clauses.push("description = ?");
            }
            if input.full_prompt.is_some() {
                set_clauses.push("full_prompt = ?");
            }

            let query = format!("UPDATE prompts SET {} WHERE id = ?", set_clauses.join(", "));
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
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
        }

        if let Some(ref names) = input.tags {
            sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = ?")
                .bind(id.to_string())
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
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, filter: PromptFilter, page: PageParams) -> DbResult<PageResult<Prompt>> {
        let mut conn = self.pool.acquire().await?;

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
        let sql = SqlFilter::build(&resolved, Dialect::Sqlite);
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

        let mut items = rows
            .iter()
            .map(Self::parse_prompt)
            .collect::<DbResult<Vec<_>>>()?;
        attach_tags(&mut conn, &mut items).await?;

        Ok(PageResult::new(items, total))
    }
}
