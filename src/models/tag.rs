use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named label, unique by name and shared across prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Tag {
    pub id: Uuid,
    /// Tag name, case-sensitive as stored
    #[cfg_attr(feature = "utoipa", schema(example = "python"))]
    pub name: String,
}

/// Sort tags by name, the order in which a prompt exposes them.
pub fn sort_tags(tags: &mut [Tag]) {
    tags.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_tags_is_bytewise() {
        let mut tags: Vec<Tag> = ["web", "Python", "coding"]
            .into_iter()
            .map(|name| Tag {
                id: Uuid::new_v4(),
                name: name.to_string(),
            })
            .collect();

        sort_tags(&mut tags);

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "coding", "web"]);
    }
}
