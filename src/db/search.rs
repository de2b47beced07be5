//! Prompt search predicate composition.
//!
//! Both backends share one WHERE clause for counting and for fetching a page,
//! so `total` and the returned items always describe the same filtered set.
//!
//! - **Tag filter**: the prompt id must be among the prompts linked to every
//!   requested tag. The ids come from a grouped subquery over `prompt_tags`
//!   (`HAVING COUNT(DISTINCT tag_id) = n`), so a prompt is never repeated no
//!   matter how many of its links match.
//! - **Text filter**: case-insensitive substring match on title, description
//!   or full prompt. LIKE wildcards in the query are escaped.

use uuid::Uuid;

/// SQL flavour, deciding placeholder syntax and case-insensitive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders, `LOWER(..) LIKE LOWER(..)`.
    ///
    /// SQLite's `LOWER` only folds ASCII, so "école" does not match "École"
    /// here while it does on PostgreSQL.
    Sqlite,
    /// `$n` placeholders, `ILIKE` (Unicode-aware case folding)
    Postgres,
}

/// Bind values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Uuid(Uuid),
}

/// A prompt filter whose tag names have already been resolved to ids.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFilter<'a> {
    /// Distinct ids of the required tags.
    pub tag_ids: Vec<Uuid>,
    /// Non-empty text query.
    pub text: Option<&'a str>,
}

/// A WHERE clause over `prompts p` plus its bindings.
#[derive(Debug, Clone)]
pub struct SqlFilter {
    dialect: Dialect,
    /// Conditions joined with AND; empty when nothing is filtered.
    conditions: Vec<String>,
    /// Bind values in order
    pub bindings: Vec<SqlValue>,
}

impl SqlFilter {
    pub fn build(filter: &ResolvedFilter<'_>, dialect: Dialect) -> Self {
        let mut sql = SqlFilter {
            dialect,
            conditions: Vec::new(),
            bindings: Vec::new(),
        };

        if !filter.tag_ids.is_empty() {
            let placeholders = filter
                .tag_ids
                .iter()
                .map(|id| sql.push_binding(SqlValue::Uuid(*id)))
                .collect::<Vec<_>>()
                .join(", ");
            let count = sql.push_binding(SqlValue::Int(filter.tag_ids.len() as i64));
            sql.conditions.push(format!(
                "p.id IN (SELECT pt.prompt_id FROM prompt_tags pt WHERE pt.tag_id IN ({}) \
                 GROUP BY pt.prompt_id HAVING COUNT(DISTINCT pt.tag_id) = {})",
                placeholders, count
            ));
        }

        if let Some(text) = filter.text {
            let pattern = format!("%{}%", escape_like_pattern(text));
            let condition = match dialect {
                Dialect::Sqlite => {
                    // Positional placeholders need one binding per use
                    let columns = ["p.title", "p.description", "p.full_prompt"];
                    let parts: Vec<String> = columns
                        .iter()
                        .map(|col| {
                            let p = sql.push_binding(SqlValue::Text(pattern.clone()));
                            format!("LOWER({}) LIKE LOWER({}) ESCAPE '\\'", col, p)
                        })
                        .collect();
                    format!("({})", parts.join(" OR "))
                }
                Dialect::Postgres => {
                    let p = sql.push_binding(SqlValue::Text(pattern));
                    format!(
                        "(p.title ILIKE {p} ESCAPE '\\' OR p.description ILIKE {p} ESCAPE '\\' \
                         OR p.full_prompt ILIKE {p} ESCAPE '\\')"
                    )
                }
            };
            sql.conditions.push(condition);
        }

        sql
    }

    /// The `WHERE ...` clause, or an empty string for an unfiltered query.
    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Placeholder for the next bind value appended after the filter's own.
    ///
    /// `offset` is zero-based: the first extra value is `next_placeholder(0)`.
    pub fn next_placeholder(&self, offset: usize) -> String {
        self.dialect.placeholder(self.bindings.len() + offset + 1)
    }

    fn push_binding(&mut self, value: SqlValue) -> String {
        self.bindings.push(value);
        self.dialect.placeholder(self.bindings.len())
    }
}

impl Dialect {
    /// Placeholder for the one-based bind position `n`.
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }
}

/// Escape LIKE special characters so the input matches literally.
fn escape_like_pattern(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        let sql = SqlFilter::build(&ResolvedFilter::default(), Dialect::Sqlite);
        assert_eq!(sql.where_sql(), "");
        assert!(sql.bindings.is_empty());
        assert_eq!(sql.next_placeholder(0), "?");

        let sql = SqlFilter::build(&ResolvedFilter::default(), Dialect::Postgres);
        assert_eq!(sql.next_placeholder(0), "$1");
        assert_eq!(sql.next_placeholder(1), "$2");
    }

    #[test]
    fn test_tag_filter_sqlite() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let filter = ResolvedFilter {
            tag_ids: vec![a, b],
            text: None,
        };
        let sql = SqlFilter::build(&filter, Dialect::Sqlite);

        assert_eq!(
            sql.where_sql(),
            "WHERE p.id IN (SELECT pt.prompt_id FROM prompt_tags pt WHERE pt.tag_id IN (?, ?) \
             GROUP BY pt.prompt_id HAVING COUNT(DISTINCT pt.tag_id) = ?)"
        );
        assert_eq!(
            sql.bindings,
            vec![SqlValue::Uuid(a), SqlValue::Uuid(b), SqlValue::Int(2)]
        );
    }

    #[test]
    fn test_text_filter_sqlite_binds_each_column() {
        let filter = ResolvedFilter {
            tag_ids: vec![],
            text: Some("Python"),
        };
        let sql = SqlFilter::build(&filter, Dialect::Sqlite);

        assert_eq!(
            sql.where_sql(),
            "WHERE (LOWER(p.title) LIKE LOWER(?) ESCAPE '\\' \
             OR LOWER(p.description) LIKE LOWER(?) ESCAPE '\\' \
             OR LOWER(p.full_prompt) LIKE LOWER(?) ESCAPE '\\')"
        );
        assert_eq!(sql.bindings.len(), 3);
        assert!(
            sql.bindings
                .iter()
                .all(|b| *b == SqlValue::Text("%Python%".into()))
        );
    }

    #[test]
    fn test_combined_filter_postgres_numbering() {
        let id = Uuid::new_v4();
        let filter = ResolvedFilter {
            tag_ids: vec![id],
            text: Some("rust"),
        };
        let sql = SqlFilter::build(&filter, Dialect::Postgres);

        assert_eq!(
            sql.where_sql(),
            "WHERE p.id IN (SELECT pt.prompt_id FROM prompt_tags pt WHERE pt.tag_id IN ($1) \
             GROUP BY pt.prompt_id HAVING COUNT(DISTINCT pt.tag_id) = $2) \
             AND (p.title ILIKE $3 ESCAPE '\\' OR p.description ILIKE $3 ESCAPE '\\' \
             OR p.full_prompt ILIKE $3 ESCAPE '\\')"
        );
        assert_eq!(
            sql.bindings,
            vec![
                SqlValue::Uuid(id),
                SqlValue::Int(1),
                SqlValue::Text("%rust%".into())
            ]
        );
        assert_eq!(sql.next_placeholder(0), "$4");
    }

    #[test]
    fn test_like_wildcards_escaped() {
        let filter = ResolvedFilter {
            tag_ids: vec![],
            text: Some("100%_done"),
        };
        let sql = SqlFilter::build(&filter, Dialect::Postgres);
        assert_eq!(
            sql.bindings,
            vec![SqlValue::Text("%100\\%\\_done%".into())]
        );
    }

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("hello"), "hello");
        assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
        assert_eq!(escape_like_pattern("a%_\\b"), "a\\%\\_\\\\b");
    }
}
