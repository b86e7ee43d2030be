// gmark/src/domain/category.rs
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::owner::validate_owner;
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use std::fmt;

pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// A user-defined folder for bookmarks, optionally nested under a parent
/// owned by the same user.
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(setter(into))]
pub struct Category {
    #[builder(default)]
    pub id: Option<i32>,
    pub owner_id: String,
    pub name: String,
    #[builder(default)]
    pub description: Option<String>,
    #[builder(default)]
    pub color: Option<String>,
    #[builder(default)]
    pub icon: Option<String>,
    #[builder(default)]
    pub cover_bookmark_id: Option<i32>,
    #[builder(default)]
    pub parent_id: Option<i32>,
    #[builder(default)]
    pub sort_index: i32,
    #[builder(default = "false")]
    pub is_public: bool,
    #[builder(default)]
    pub share_token: Option<String>,
    /// Set only on the lazily created "Uncategorized" row.
    #[builder(default = "false")]
    pub is_system: bool,
    #[builder(default = "Utc::now()")]
    pub created_at: DateTime<Utc>,
    #[builder(default = "Utc::now()")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub cover_bookmark_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub is_public: bool,
}

/// Partial update; the outer `Option` means "leave unchanged", the inner one
/// allows clearing nullable attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub cover_bookmark_id: Option<Option<i32>>,
    pub parent_id: Option<Option<i32>>,
    pub is_public: Option<bool>,
}

/// A category together with its number of member bookmarks
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: Category,
    pub bookmark_count: i64,
}

impl Category {
    pub fn new(owner_id: &str, input: NewCategory) -> DomainResult<Self> {
        validate_owner(owner_id)?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            owner_id: owner_id.to_string(),
            name: validate_name(&input.name)?,
            description: validate_description(input.description)?,
            color: validate_color(input.color)?,
            icon: normalize_optional(input.icon),
            cover_bookmark_id: input.cover_bookmark_id,
            parent_id: input.parent_id,
            sort_index: 0,
            is_public: input.is_public,
            share_token: None,
            is_system: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// The per-owner fallback category
    pub fn uncategorized(owner_id: &str) -> DomainResult<Self> {
        validate_owner(owner_id)?;
        Ok(CategoryBuilder::default()
            .owner_id(owner_id)
            .name(UNCATEGORIZED_NAME)
            .is_system(true)
            .build()?)
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    pub fn belongs_to(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// System categories can be listed and filled but never edited, shared or deleted.
    pub fn ensure_mutable(&self) -> DomainResult<()> {
        if self.is_system {
            return Err(DomainError::ImmutableCategory(format!(
                "'{}' is managed by the system",
                self.name
            )));
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: CategoryPatch) -> DomainResult<()> {
        self.ensure_mutable()?;

        if let Some(name) = patch.name {
            self.name = validate_name(&name)?;
        }
        if let Some(description) = patch.description {
            self.description = validate_description(description)?;
        }
        if let Some(color) = patch.color {
            self.color = validate_color(color)?;
        }
        if let Some(icon) = patch.icon {
            self.icon = normalize_optional(icon);
        }
        if let Some(cover) = patch.cover_bookmark_id {
            self.cover_bookmark_id = cover;
        }
        if let Some(parent_id) = patch.parent_id {
            if parent_id.is_some() && parent_id == self.id {
                return Err(DomainError::InvalidCategory(
                    "a category cannot be its own parent".to_string(),
                ));
            }
            self.parent_id = parent_id;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidCategory(
            "name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidCategory(format!(
            "name longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.eq_ignore_ascii_case(UNCATEGORIZED_NAME) {
        return Err(DomainError::InvalidCategory(format!(
            "'{}' is reserved",
            UNCATEGORIZED_NAME
        )));
    }
    Ok(name.to_string())
}

fn validate_description(description: Option<String>) -> DomainResult<Option<String>> {
    let description = normalize_optional(description);
    if let Some(d) = &description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::InvalidCategory(format!(
                "description longer than {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok(description)
}

/// Colors are `#rrggbb`, stored lowercase.
fn validate_color(color: Option<String>) -> DomainResult<Option<String>> {
    match normalize_optional(color) {
        None => Ok(None),
        Some(c) => {
            let hex = c.strip_prefix('#').unwrap_or("");
            if hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
                Ok(Some(c.to_lowercase()))
            } else {
                Err(DomainError::InvalidCategory(format!(
                    "color '{}' is not of the form #rrggbb",
                    c
                )))
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.id.map_or("New".to_string(), |id| id.to_string()),
            self.name,
            self.owner_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_category_normalizes_fields() {
        let category = Category::new(
            "alice",
            NewCategory {
                name: "  Landscapes ".to_string(),
                description: Some("   ".to_string()),
                color: Some("#A0B1C2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(category.name, "Landscapes");
        assert_eq!(category.description, None);
        assert_eq!(category.color.as_deref(), Some("#a0b1c2"));
        assert!(!category.is_system);
    }

    #[test]
    fn test_invalid_names_and_colors() {
        assert!(Category::new("alice", input("")).is_err());
        assert!(Category::new("alice", input(&"x".repeat(101))).is_err());
        assert!(Category::new("alice", input("uncategorized")).is_err());

        let bad_color = NewCategory {
            name: "ok".to_string(),
            color: Some("red".to_string()),
            ..Default::default()
        };
        assert!(Category::new("alice", bad_color).is_err());
    }

    #[test]
    fn given_system_category_when_patched_then_rejected() {
        let mut category = Category::uncategorized("alice").unwrap();
        assert_eq!(category.name, UNCATEGORIZED_NAME);

        let result = category.apply(CategoryPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(DomainError::ImmutableCategory(_))));
        assert_eq!(category.name, UNCATEGORIZED_NAME);
    }

    #[test]
    fn given_patch_with_inner_none_then_clears_attribute() {
        let mut category = Category::new(
            "alice",
            NewCategory {
                name: "Cats".to_string(),
                icon: Some("cat".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        category
            .apply(CategoryPatch {
                icon: Some(None),
                is_public: Some(true),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(category.icon, None);
        assert!(category.is_public);
        assert_eq!(category.name, "Cats");
    }

    #[test]
    fn given_self_parent_when_patched_then_rejected() {
        let mut category = Category::new("alice", input("Cats")).unwrap();
        category.set_id(4);

        let result = category.apply(CategoryPatch {
            parent_id: Some(Some(4)),
            ..Default::default()
        });
        assert!(matches!(result, Err(DomainError::InvalidCategory(_))));
    }
}
