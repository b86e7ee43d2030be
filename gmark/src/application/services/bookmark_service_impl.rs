// src/application/services/bookmark_service_impl.rs
use std::sync::Arc;

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::bookmark_service::{
    BookmarkPage, BookmarkService, NewBookmark, DEFAULT_MAX_BATCH_ITEMS,
};
use crate::domain::bookmark::{Bookmark, BookmarkPatch};
use crate::domain::content::ContentRef;
use crate::domain::owner::validate_owner;
use crate::domain::repositories::cursor::PageCursor;
use crate::domain::repositories::query::BookmarkQuery;
use crate::domain::repositories::repository::BookmarkRepository;
use crate::domain::status::{complete_status_map, BookmarkStatus, StatusMap};
use itertools::Itertools;
use tracing::{debug, instrument};

#[derive(Debug)]
pub struct BookmarkServiceImpl<R: BookmarkRepository> {
    repository: Arc<R>,
    max_batch_items: usize,
}

impl<R: BookmarkRepository> BookmarkServiceImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
        }
    }

    pub fn with_max_batch_items(mut self, max_batch_items: usize) -> Self {
        self.max_batch_items = max_batch_items.max(1);
        self
    }

    #[instrument(skip(self), level = "trace")]
    fn validate_bookmark_id(&self, id: i32) -> ApplicationResult<()> {
        if id <= 0 {
            return Err(ApplicationError::Validation(format!(
                "Invalid bookmark ID: {}",
                id
            )));
        }
        Ok(())
    }

    /// The owner's bookmark, or not-found. Another owner's bookmark reads as
    /// not found so that ids do not leak across users.
    fn owned_bookmark(&self, owner_id: &str, id: i32) -> ApplicationResult<Bookmark> {
        self.validate_bookmark_id(id)?;
        validate_owner(owner_id)?;
        match self.repository.get_by_id(id)? {
            Some(bookmark) if bookmark.belongs_to(owner_id) => Ok(bookmark),
            _ => Err(ApplicationError::BookmarkNotFound(id)),
        }
    }
}

impl<R: BookmarkRepository> BookmarkService for BookmarkServiceImpl<R> {
    #[instrument(skip(self, input), level = "debug", fields(owner = %owner_id, content = %input.content))]
    fn add_bookmark(&self, owner_id: &str, input: NewBookmark) -> ApplicationResult<Bookmark> {
        if let Some(existing) = self.repository.get_by_content(owner_id, &input.content)? {
            return Err(ApplicationError::BookmarkExists(
                existing.id.unwrap_or_default(),
                input.content.to_string(),
            ));
        }

        let mut bookmark = Bookmark::new(owner_id, input.content, input.note.as_str())?;
        bookmark.pinned = input.pinned;
        bookmark.is_public = input.is_public;

        // a concurrent create still hits the unique constraint
        self.repository.add(&mut bookmark)?;
        debug!("Created bookmark {}", bookmark);
        Ok(bookmark)
    }

    #[instrument(skip(self), level = "debug")]
    fn update_bookmark(
        &self,
        owner_id: &str,
        id: i32,
        patch: &BookmarkPatch,
    ) -> ApplicationResult<Bookmark> {
        let mut bookmark = self.owned_bookmark(owner_id, id)?;
        if bookmark.apply(patch)? {
            self.repository.update(&bookmark)?;
        } else {
            debug!("Nothing to update for bookmark {}", id);
        }
        Ok(bookmark)
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_bookmark(&self, owner_id: &str, id: i32) -> ApplicationResult<Bookmark> {
        let bookmark = self.owned_bookmark(owner_id, id)?;
        if !self.repository.delete(owner_id, id)? {
            return Err(ApplicationError::BookmarkNotFound(id));
        }
        Ok(bookmark)
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmark(&self, id: i32) -> ApplicationResult<Option<Bookmark>> {
        self.validate_bookmark_id(id)?;

        let bookmark = self.repository.get_by_id(id)?;
        Ok(bookmark)
    }

    #[instrument(skip(self), level = "debug")]
    fn check_status(
        &self,
        owner_id: &str,
        content: &ContentRef,
    ) -> ApplicationResult<BookmarkStatus<Bookmark>> {
        validate_owner(owner_id)?;
        let bookmark = self.repository.get_by_content(owner_id, content)?;
        Ok(BookmarkStatus::from(bookmark))
    }

    #[instrument(skip(self, items), level = "debug", fields(owner = %owner_id, n = items.len()))]
    fn resolve_batch_status(
        &self,
        owner_id: &str,
        items: &[ContentRef],
    ) -> ApplicationResult<StatusMap<Bookmark>> {
        validate_owner(owner_id)?;
        if items.is_empty() {
            return Ok(StatusMap::new());
        }

        let distinct: Vec<ContentRef> = items.iter().copied().unique().collect();
        if distinct.len() > self.max_batch_items {
            return Err(ApplicationError::Validation(format!(
                "batch of {} items exceeds the limit of {}",
                distinct.len(),
                self.max_batch_items
            )));
        }

        let found = self.repository.find_by_contents(owner_id, &distinct)?;
        debug!("{} of {} items bookmarked", found.len(), distinct.len());
        Ok(complete_status_map(&distinct, found, Bookmark::status_key))
    }

    #[instrument(skip(self, query), level = "debug", fields(owner = %query.owner_id))]
    fn list_bookmarks(&self, query: &BookmarkQuery) -> ApplicationResult<BookmarkPage> {
        validate_owner(&query.owner_id)?;

        // one extra row tells whether another page follows
        let mut probe = query.clone();
        probe.limit = query.limit + 1;
        let mut items = self.repository.list(&probe)?;

        let next_cursor = if items.len() > query.limit {
            items.truncate(query.limit);
            items
                .last()
                .and_then(|last| last.id.map(|id| PageCursor::new(last.created_at, id)))
                .map(|cursor| cursor.encode())
        } else {
            None
        };

        Ok(BookmarkPage { items, next_cursor })
    }

    #[instrument(skip(self), level = "debug")]
    fn sync_categories(
        &self,
        owner_id: &str,
        bookmark_id: i32,
        category_ids: &[i32],
    ) -> ApplicationResult<Vec<i32>> {
        self.owned_bookmark(owner_id, bookmark_id)?;
        if let Some(bad) = category_ids.iter().find(|id| **id <= 0) {
            return Err(ApplicationError::Validation(format!(
                "Invalid category ID: {}",
                bad
            )));
        }

        let synced = self
            .repository
            .sync_categories(bookmark_id, category_ids)
            .map_err(|e| ApplicationError::from(e).context("sync categories"))?;
        Ok(synced)
    }
}
