use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use super::{PageParams, PageResult};
use crate::{
    db::error::DbResult,
    models::{CreatePrompt, Prompt, UpdatePrompt},
};

/// Filters applied by [`PromptRepo::find`]. An empty filter matches every prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFilter {
    /// Case-insensitive substring matched against title, description or full prompt.
    pub query: Option<String>,
    /// Tag names that must all be attached to a matching prompt.
    pub tags: Option<Vec<String>>,
}

impl PromptFilter {
    /// The text query, if one was given and is non-empty.
    pub fn text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    /// The distinct requested tag names.
    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.tags
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

#[async_trait]
pub trait PromptRepo: Send + Sync {
    /// Create a prompt, resolving its tag names in the same transaction.
    async fn create(&self, input: CreatePrompt) -> DbResult<Prompt>;

    /// Get a prompt by its ID, with tags loaded.
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Prompt>>;

    /// Apply a partial update. Returns `None` if the prompt does not exist.
    ///
    /// A supplied tag list replaces the prompt's tags wholesale; an empty list
    /// removes them all. Omitted tags are left alone.
    async fn update(&self, id: Uuid, input: UpdatePrompt) -> DbResult<Option<Prompt>>;

    /// Delete a prompt and its tag links. Tags themselves are kept.
    ///
    /// Returns whether a prompt was deleted.
    async fn delete(&self, id: Uuid) -> DbResult<bool>;

    /// Find prompts matching `filter`, newest first, windowed by `page`.
    ///
    /// If any requested tag does not exist the result is empty. `total` counts
    /// every match before windowing.
    async fn find(&self, filter: PromptFilter, page: PageParams) -> DbResult<PageResult<Prompt>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_ignores_empty_query() {
        let filter = PromptFilter {
            query: Some(String::new()),
            tags: None,
        };
        assert_eq!(filter.text(), None);

        let filter = PromptFilter {
            query: Some("rust".into()),
            tags: None,
        };
        assert_eq!(filter.text(), Some("rust"));
    }

    #[test]
    fn test_tag_names_are_deduplicated() {
        let filter = PromptFilter {
            query: None,
            tags: Some(vec!["web".into(), "coding".into(), "web".into()]),
        };
        let names: Vec<&str> = filter.tag_names().into_iter().collect();
        assert_eq!(names, vec!["coding", "web"]);
    }
}
