use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    db::{DbError, DbPool, PageParams, PromptFilter},
    models::{
        CreatePrompt, MAX_PAGE_LIMIT, PageQuery, Prompt, PromptPage, PromptSearch, UpdatePrompt,
    },
};

#[derive(Debug, Error)]
pub enum PromptServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Prompt not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl From<ValidationErrors> for PromptServiceError {
    fn from(errors: ValidationErrors) -> Self {
        PromptServiceError::Validation(describe_validation_errors(&errors))
    }
}

pub type PromptServiceResult<T> = Result<T, PromptServiceError>;

/// Service layer for prompt management.
///
/// Validates requests, maps absence onto [`PromptServiceError::NotFound`] and
/// turns windowed repository results into numbered pages.
#[derive(Clone)]
pub struct PromptService {
    db: Arc<DbPool>,
}

impl PromptService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create a prompt, creating any tags it names that do not exist yet.
    #[tracing::instrument(name = "prompts.create", skip(self, input), fields(tags = input.tags.len()))]
    pub async fn create(&self, input: CreatePrompt) -> PromptServiceResult<Prompt> {
        input.validate()?;

        let prompt = self.db.prompts().create(input).await?;
        tracing::info!(prompt_id = %prompt.id, tags = prompt.tags.len(), "Prompt created");
        Ok(prompt)
    }

    /// Get a prompt by ID
    #[tracing::instrument(name = "prompts.get", skip(self))]
    pub async fn get(&self, id: Uuid) -> PromptServiceResult<Prompt> {
        self.db
            .prompts()
            .get_by_id(id)
            .await?
            .ok_or(PromptServiceError::NotFound)
    }

    /// Apply a partial update.
    #[tracing::instrument(name = "prompts.update", skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdatePrompt) -> PromptServiceResult<Prompt> {
        input.validate()?;

        if input.is_empty() {
            tracing::debug!(prompt_id = %id, "Update changes nothing");
            return self.get(id).await;
        }

        let replaces_tags = input.tags.is_some();
        let prompt = self
            .db
            .prompts()
            .update(id, input)
            .await?
            .ok_or(PromptServiceError::NotFound)?;

        tracing::info!(
            prompt_id = %prompt.id,
            replaced_tags = replaces_tags,
            tags = prompt.tags.len(),
            "Prompt updated"
        );
        Ok(prompt)
    }

    /// Delete a prompt. Its tags stay behind for reuse.
    #[tracing::instrument(name = "prompts.delete", skip(self))]
    pub async fn delete(&self, id: Uuid) -> PromptServiceResult<()> {
        if !self.db.prompts().delete(id).await? {
            return Err(PromptServiceError::NotFound);
        }
        tracing::info!(prompt_id = %id, "Prompt deleted");
        Ok(())
    }

    /// List every prompt, newest first.
    #[tracing::instrument(name = "prompts.list", skip(self))]
    pub async fn list(&self, page: PageQuery) -> PromptServiceResult<PromptPage> {
        self.find(PromptFilter::default(), page).await
    }

    /// Search prompts by free text and required tags.
    #[tracing::instrument(
        name = "prompts.search",
        skip(self, search),
        fields(tags = search.tags.as_ref().map_or(0, Vec::len))
    )]
    pub async fn search(
        &self,
        search: PromptSearch,
        page: PageQuery,
    ) -> PromptServiceResult<PromptPage> {
        let filter = PromptFilter {
            query: search.query,
            tags: search.tags,
        };
        self.find(filter, page).await
    }

    async fn find(&self, filter: PromptFilter, page: PageQuery) -> PromptServiceResult<PromptPage> {
        validate_page(&page)?;

        let result = self
            .db
            .prompts()
            .find(filter, PageParams::new(page.skip, page.limit))
            .await?;

        tracing::debug!(
            returned = result.items.len(),
            total = result.total,
            skip = page.skip,
            limit = page.limit,
            "Prompts found"
        );

        Ok(PromptPage {
            items: result.items,
            total: result.total,
            page: page.skip / page.limit + 1,
            size: page.limit,
        })
    }
}

fn validate_page(page: &PageQuery) -> PromptServiceResult<()> {
    if page.skip < 0 {
        return Err(PromptServiceError::Validation(
            "skip: must be zero or greater".to_string(),
        ));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&page.limit) {
        return Err(PromptServiceError::Validation(format!(
            "limit: must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    Ok(())
}

/// Flatten validator output into `field: message` pairs, ordered by field.
fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let detail = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{field}: {detail}")
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
