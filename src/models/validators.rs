use std::{borrow::Cow, collections::HashSet};

use validator::ValidationError;

/// Maximum length of a tag name, in characters.
pub const MAX_TAG_NAME_LENGTH: usize = 50;

/// Maximum number of tags a single request may carry.
const MAX_TAGS_COUNT: usize = 100;

/// Validate tag names supplied with a prompt or a search.
///
/// Ensures that:
/// - No more than MAX_TAGS_COUNT distinct tags are provided
/// - No tag is empty or whitespace-only
/// - No tag exceeds MAX_TAG_NAME_LENGTH characters
///
/// Duplicates are allowed here; they collapse into one tag downstream.
pub fn validate_tag_names(names: &[String]) -> Result<(), ValidationError> {
    let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
    if distinct.len() > MAX_TAGS_COUNT {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(Cow::Owned(format!(
            "Maximum {} tags allowed",
            MAX_TAGS_COUNT
        )));
        return Err(err);
    }

    for name in names {
        if name.trim().is_empty() {
            let mut err = ValidationError::new("empty_tag");
            err.message = Some(Cow::Borrowed(
                "Tag names cannot be empty or whitespace-only",
            ));
            return Err(err);
        }
        if name.chars().count() > MAX_TAG_NAME_LENGTH {
            let mut err = ValidationError::new("tag_too_long");
            err.message = Some(Cow::Owned(format!(
                "Tag names cannot exceed {} characters",
                MAX_TAG_NAME_LENGTH
            )));
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_tags() {
        assert!(validate_tag_names(&tags(&["python", "coding", "web-dev"])).is_ok());
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(validate_tag_names(&[]).is_ok());
    }

    #[test]
    fn test_duplicates_are_valid() {
        assert!(validate_tag_names(&tags(&["python", "python"])).is_ok());
    }

    #[test]
    fn test_blank_tag_rejected() {
        let err = validate_tag_names(&tags(&["python", "  "])).unwrap_err();
        assert_eq!(err.code, "empty_tag");
    }

    #[test]
    fn test_tag_at_max_length_accepted() {
        let name = "a".repeat(MAX_TAG_NAME_LENGTH);
        assert!(validate_tag_names(&[name]).is_ok());
    }

    #[test]
    fn test_tag_over_max_length_rejected() {
        let name = "a".repeat(MAX_TAG_NAME_LENGTH + 1);
        let err = validate_tag_names(&[name]).unwrap_err();
        assert_eq!(err.code, "tag_too_long");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 50 two-byte characters
        let name = "é".repeat(MAX_TAG_NAME_LENGTH);
        assert!(validate_tag_names(&[name]).is_ok());
    }

    #[test]
    fn test_too_many_tags_rejected() {
        let names: Vec<String> = (0..=MAX_TAGS_COUNT).map(|i| format!("tag-{i}")).collect();
        let err = validate_tag_names(&names).unwrap_err();
        assert_eq!(err.code, "too_many_tags");
    }
}
