// src/application/services/bookmark_service.rs
use crate::application::error::ApplicationResult;
use crate::domain::bookmark::{Bookmark, BookmarkPatch};
use crate::domain::content::ContentRef;
use crate::domain::repositories::query::BookmarkQuery;
use crate::domain::status::{BookmarkStatus, StatusMap};
use std::fmt::Debug;

/// Default cap on items per batch status request
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 500;

/// Input for creating a bookmark
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookmark {
    pub content: ContentRef,
    pub note: String,
    pub pinned: bool,
    pub is_public: bool,
}

impl NewBookmark {
    pub fn for_content(content: ContentRef) -> Self {
        Self {
            content,
            note: String::new(),
            pinned: false,
            is_public: false,
        }
    }
}

/// One page of a bookmark listing. `next_cursor` is set when more rows follow.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkPage {
    pub items: Vec<Bookmark>,
    pub next_cursor: Option<String>,
}

/// Service interface for bookmark-related operations
pub trait BookmarkService: Send + Sync + Debug {
    /// Add a new bookmark; a second bookmark for the same content is a conflict
    fn add_bookmark(&self, owner_id: &str, input: NewBookmark) -> ApplicationResult<Bookmark>;

    /// Update note and flags of the owner's bookmark
    fn update_bookmark(
        &self,
        owner_id: &str,
        id: i32,
        patch: &BookmarkPatch,
    ) -> ApplicationResult<Bookmark>;

    /// Hard-delete the owner's bookmark and return it
    fn delete_bookmark(&self, owner_id: &str, id: i32) -> ApplicationResult<Bookmark>;

    /// Get a bookmark by ID
    fn get_bookmark(&self, id: i32) -> ApplicationResult<Option<Bookmark>>;

    /// Single-item status. Not being bookmarked is a normal value.
    fn check_status(
        &self,
        owner_id: &str,
        content: &ContentRef,
    ) -> ApplicationResult<BookmarkStatus<Bookmark>>;

    /// Status of every requested item in one repository round trip.
    /// The result has exactly one key per distinct item.
    fn resolve_batch_status(
        &self,
        owner_id: &str,
        items: &[ContentRef],
    ) -> ApplicationResult<StatusMap<Bookmark>>;

    /// One keyset page of the owner's bookmarks
    fn list_bookmarks(&self, query: &BookmarkQuery) -> ApplicationResult<BookmarkPage>;

    /// Replace the categories of the owner's bookmark; returns the resulting set
    fn sync_categories(
        &self,
        owner_id: &str,
        bookmark_id: i32,
        category_ids: &[i32],
    ) -> ApplicationResult<Vec<i32>>;
}
