// gmark/src/domain/bookmark.rs
use crate::domain::content::ContentRef;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::owner::validate_owner;
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use std::fmt;

const MAX_NOTE_LEN: usize = 2000;

/// One user's marking of one content item as a favorite
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(setter(into))]
pub struct Bookmark {
    #[builder(default)]
    pub id: Option<i32>,
    pub owner_id: String,
    pub content: ContentRef,
    #[builder(default)]
    pub note: String,
    #[builder(default = "false")]
    pub pinned: bool,
    #[builder(default = "false")]
    pub is_public: bool,
    #[builder(default = "Utc::now()")]
    pub created_at: DateTime<Utc>,
    #[builder(default = "Utc::now()")]
    pub updated_at: DateTime<Utc>,
}

/// Partial update of the mutable bookmark attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkPatch {
    pub note: Option<String>,
    pub pinned: Option<bool>,
    pub is_public: Option<bool>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.pinned.is_none() && self.is_public.is_none()
    }
}

impl Bookmark {
    pub fn new<S: AsRef<str>>(owner_id: S, content: ContentRef, note: S) -> DomainResult<Self> {
        let owner_id = owner_id.as_ref();
        validate_owner(owner_id)?;
        let note = validate_note(note.as_ref())?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            owner_id: owner_id.to_string(),
            content,
            note,
            pinned: false,
            is_public: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the ID (typically used after storage)
    pub fn set_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    pub fn belongs_to(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn status_key(&self) -> String {
        self.content.status_key()
    }

    /// Apply a patch; returns whether anything changed.
    pub fn apply(&mut self, patch: &BookmarkPatch) -> DomainResult<bool> {
        let mut changed = false;
        if let Some(note) = &patch.note {
            let note = validate_note(note)?;
            if note != self.note {
                self.note = note;
                changed = true;
            }
        }
        if let Some(pinned) = patch.pinned {
            changed |= pinned != self.pinned;
            self.pinned = pinned;
        }
        if let Some(is_public) = patch.is_public {
            changed |= is_public != self.is_public;
            self.is_public = is_public;
        }
        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }
}

fn validate_note(note: &str) -> DomainResult<String> {
    let note = note.trim();
    if note.chars().count() > MAX_NOTE_LEN {
        return Err(DomainError::InvalidBookmark(format!(
            "note longer than {} characters",
            MAX_NOTE_LEN
        )));
    }
    Ok(note.to_string())
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} -> {}{}",
            self.id.map_or("New".to_string(), |id| id.to_string()),
            self.owner_id,
            self.content,
            if self.pinned { " (pinned)" } else { "" }
        )
    }
}
