// gmark/src/domain/repositories/query.rs
use crate::domain::content::ContentSource;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::repositories::cursor::PageCursor;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 24;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "oldest",
            SortDirection::Descending => "newest",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "oldest" | "asc" => Ok(SortDirection::Ascending),
            "newest" | "desc" => Ok(SortDirection::Descending),
            other => Err(DomainError::InvalidQuery(format!(
                "unknown sort order '{}' (expected newest or oldest)",
                other
            ))),
        }
    }
}

/// One page request over a single owner's bookmarks.
///
/// Pagination is keyset-based: `after` is the cursor of the last row of the
/// previous page under the same filters and sort.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkQuery {
    pub owner_id: String,
    pub source: Option<ContentSource>,
    pub pinned: Option<bool>,
    pub category_id: Option<i32>,
    pub sort: SortDirection,
    pub after: Option<PageCursor>,
    pub limit: usize,
}

impl BookmarkQuery {
    pub fn for_owner<S: Into<String>>(owner_id: S) -> Self {
        Self {
            owner_id: owner_id.into(),
            source: None,
            pinned: None,
            category_id: None,
            sort: SortDirection::default(),
            after: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_source(mut self, source: Option<ContentSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_pinned(mut self, pinned: Option<bool>) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn with_category(mut self, category_id: Option<i32>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_after(mut self, after: Option<PageCursor>) -> Self {
        self.after = after;
        self
    }

    /// Clamped to `1..=MAX_PAGE_SIZE`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self
    }
}
