use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Tag, validators::validate_tag_names};

/// Default page size for list and search requests.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A stored prompt with its tags loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Prompt {
    pub id: Uuid,
    /// Short title of the prompt
    #[cfg_attr(feature = "utoipa", schema(example = "Python Tutorial"))]
    pub title: String,
    /// Optional description of what the prompt is for
    pub description: Option<String>,
    /// The full prompt text
    #[cfg_attr(feature = "utoipa", schema(example = "Explain Python basics"))]
    pub full_prompt: String,
    pub created_at: DateTime<Utc>,
    /// Attached tags, ordered by name
    pub tags: Vec<Tag>,
}

impl Prompt {
    /// Names of the attached tags as a set.
    pub fn tag_names(&self) -> BTreeSet<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}

/// Request to create a prompt.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CreatePrompt {
    /// Short title (1-255 characters)
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// The full prompt text
    #[validate(length(min = 1))]
    pub full_prompt: String,
    /// Tag names to attach; missing tags are created
    #[serde(default, deserialize_with = "deserialize_tag_list")]
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Vec<String>,
}

/// Request to update a prompt. Fields left out are not changed.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UpdatePrompt {
    /// New title
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    /// New description (`null` clears it)
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>))]
    pub description: Option<Option<String>>,
    /// New prompt text
    #[validate(length(min = 1))]
    pub full_prompt: Option<String>,
    /// Replacement tag set (`null` or `[]` removes every tag)
    #[serde(default, deserialize_with = "deserialize_tag_replacement")]
    #[validate(custom(function = "validate_tag_names"))]
    pub tags: Option<Vec<String>>,
}

impl UpdatePrompt {
    /// True when no column of the prompt row changes.
    pub fn has_field_changes(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.full_prompt.is_some()
    }

    /// True when the request changes nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.has_field_changes() && self.tags.is_none()
    }
}

/// Custom deserializer that handles:
/// - Missing field -> None (don't update)
/// - null -> Some(None) (clear)
/// - string -> Some(Some(string)) (set)
fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::<String>::deserialize(deserializer)?))
}

/// Custom deserializer for replacement tag sets:
/// - Missing field -> None (tags untouched)
/// - null -> Some(vec![]) (clear all tags)
/// - list -> Some(list) (replace)
fn deserialize_tag_replacement<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(
        Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default(),
    ))
}

/// Treats an explicit `null` tag list on create the same as an empty one.
fn deserialize_tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Search request body.
///
/// Text matches are case-insensitive substrings of the title, description or
/// full prompt. Every listed tag must be present on a matching prompt.
///
/// Tag names are matched exactly and never rejected: a name no tag carries
/// just yields an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PromptSearch {
    /// Free-text query
    #[serde(default)]
    pub query: Option<String>,
    /// Tag names that must all be attached
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Offset pagination query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "utoipa", into_params(parameter_in = Query))]
pub struct PageQuery {
    /// Number of records to skip
    #[serde(default)]
    pub skip: i64,
    /// Page size (1-100)
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

fn default_page_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// A page of prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PromptPage {
    pub items: Vec<Prompt>,
    /// Number of prompts matching the request, across all pages
    pub total: i64,
    /// One-based page number, `skip / limit + 1`
    pub page: i64,
    /// Requested page size
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_missing_fields_are_none() {
        let update: UpdatePrompt = serde_json::from_str("{}").unwrap();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.tags.is_none());
        assert!(update.is_empty());
    }

    #[test]
    fn test_update_null_description_clears() {
        let update: UpdatePrompt = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert!(update.has_field_changes());
    }

    #[test]
    fn test_update_description_value_sets() {
        let update: UpdatePrompt = serde_json::from_str(r#"{"description": "new"}"#).unwrap();
        assert_eq!(update.description, Some(Some("new".to_string())));
    }

    #[test]
    fn test_update_null_tags_clears() {
        let update: UpdatePrompt = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert_eq!(update.tags, Some(vec![]));
        assert!(!update.has_field_changes());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_empty_tags_clears() {
        let update: UpdatePrompt = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert_eq!(update.tags, Some(vec![]));
    }

    #[test]
    fn test_create_tags_default_to_empty() {
        let create: CreatePrompt =
            serde_json::from_str(r#"{"title": "t", "full_prompt": "p"}"#).unwrap();
        assert!(create.tags.is_empty());
        assert!(create.description.is_none());

        let create: CreatePrompt =
            serde_json::from_str(r#"{"title": "t", "full_prompt": "p", "tags": null}"#).unwrap();
        assert!(create.tags.is_empty());
    }

    #[test]
    fn test_create_validation() {
        let valid = CreatePrompt {
            title: "Title".into(),
            description: None,
            full_prompt: "body".into(),
            tags: vec!["a".into()],
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreatePrompt {
            title: String::new(),
            ..valid.clone()
        };
        assert!(empty_title.validate().is_err());

        let long_title = CreatePrompt {
            title: "x".repeat(256),
            ..valid.clone()
        };
        assert!(long_title.validate().is_err());

        let empty_body = CreatePrompt {
            full_prompt: String::new(),
            ..valid.clone()
        };
        assert!(empty_body.validate().is_err());

        let bad_tag = CreatePrompt {
            tags: vec!["t".repeat(51)],
            ..valid
        };
        assert!(bad_tag.validate().is_err());
    }

    #[test]
    fn test_page_query_defaults() {
        let page: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }
}
