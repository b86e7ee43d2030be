// src/application/services/category_service_impl.rs
use std::sync::Arc;

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::category_service::CategoryService;
use crate::domain::category::{Category, CategoryPatch, CategorySummary, NewCategory};
use crate::domain::error::DomainError;
use crate::domain::owner::validate_owner;
use crate::domain::repositories::repository::{BookmarkRepository, CategoryRepository};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Upper bound on the ancestor walk; deeper trees are rejected as malformed.
const MAX_DEPTH: usize = 64;

#[derive(Debug)]
pub struct CategoryServiceImpl<C: CategoryRepository, B: BookmarkRepository> {
    categories: Arc<C>,
    bookmarks: Arc<B>,
}

impl<C: CategoryRepository, B: BookmarkRepository> CategoryServiceImpl<C, B> {
    pub fn new(categories: Arc<C>, bookmarks: Arc<B>) -> Self {
        Self {
            categories,
            bookmarks,
        }
    }

    fn owned_category(&self, owner_id: &str, id: i32) -> ApplicationResult<Category> {
        validate_owner(owner_id)?;
        if id <= 0 {
            return Err(ApplicationError::Validation(format!(
                "Invalid category ID: {}",
                id
            )));
        }
        match self.categories.get_by_id(id)? {
            Some(category) if category.belongs_to(owner_id) => Ok(category),
            _ => Err(ApplicationError::CategoryNotFound(id)),
        }
    }

    /// Only existence is checked here; the parent's owner is enforced by the
    /// store's composite key.
    fn ensure_parent_exists(&self, parent_id: i32) -> ApplicationResult<()> {
        if self.categories.get_by_id(parent_id)?.is_none() {
            return Err(ApplicationError::Validation(format!(
                "parent category {} does not exist",
                parent_id
            )));
        }
        Ok(())
    }

    fn ensure_cover_owned(&self, owner_id: &str, bookmark_id: i32) -> ApplicationResult<()> {
        match self.bookmarks.get_by_id(bookmark_id)? {
            None => Err(ApplicationError::Validation(format!(
                "cover bookmark {} does not exist",
                bookmark_id
            ))),
            Some(bookmark) if !bookmark.belongs_to(owner_id) => {
                Err(DomainError::OwnershipViolation(
                    "cover bookmark must belong to the same user".to_string(),
                )
                .into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Walks up from `new_parent`; reaching `id` means the move would make
    /// the category its own ancestor.
    #[instrument(skip(self), level = "trace")]
    fn ensure_no_cycle(&self, id: i32, new_parent: i32) -> ApplicationResult<()> {
        let mut current = Some(new_parent);
        let mut depth = 0;
        while let Some(ancestor) = current {
            if ancestor == id {
                return Err(ApplicationError::Validation(format!(
                    "moving category {} under {} would create a cycle",
                    id, new_parent
                )));
            }
            depth += 1;
            if depth > MAX_DEPTH {
                return Err(ApplicationError::Validation(format!(
                    "categories nest deeper than {} levels",
                    MAX_DEPTH
                )));
            }
            current = self
                .categories
                .get_by_id(ancestor)?
                .and_then(|category| category.parent_id);
        }
        Ok(())
    }
}

impl<C: CategoryRepository, B: BookmarkRepository> CategoryService for CategoryServiceImpl<C, B> {
    #[instrument(skip(self), level = "debug")]
    fn list_categories(&self, owner_id: &str) -> ApplicationResult<Vec<CategorySummary>> {
        validate_owner(owner_id)?;
        if self.categories.count_for_owner(owner_id)? == 0 {
            let uncategorized = self.categories.ensure_uncategorized(owner_id)?;
            debug!("Materialized {}", uncategorized);
        }
        Ok(self.categories.list_with_counts(owner_id)?)
    }

    #[instrument(skip(self), level = "debug")]
    fn get_category(&self, owner_id: &str, id: i32) -> ApplicationResult<Category> {
        self.owned_category(owner_id, id)
    }

    #[instrument(skip(self, input), level = "debug", fields(name = %input.name))]
    fn create_category(&self, owner_id: &str, input: NewCategory) -> ApplicationResult<Category> {
        let mut category = Category::new(owner_id, input)?;

        if let Some(parent_id) = category.parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        if let Some(cover) = category.cover_bookmark_id {
            self.ensure_cover_owned(owner_id, cover)?;
        }

        self.categories
            .add(&mut category)
            .map_err(|e| ApplicationError::from(e).context("create category"))?;
        Ok(category)
    }

    #[instrument(skip(self, patch), level = "debug")]
    fn update_category(
        &self,
        owner_id: &str,
        id: i32,
        patch: CategoryPatch,
    ) -> ApplicationResult<Category> {
        let mut category = self.owned_category(owner_id, id)?;
        category.ensure_mutable()?;

        if let Some(Some(parent_id)) = patch.parent_id {
            self.ensure_parent_exists(parent_id)?;
            self.ensure_no_cycle(id, parent_id)?;
        }
        if let Some(Some(cover)) = patch.cover_bookmark_id {
            self.ensure_cover_owned(owner_id, cover)?;
        }

        category.apply(patch)?;
        self.categories
            .update(&category)
            .map_err(|e| ApplicationError::from(e).context("update category"))?;
        Ok(category)
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_category(
        &self,
        owner_id: &str,
        id: i32,
        move_to: Option<i32>,
    ) -> ApplicationResult<()> {
        let category = self.owned_category(owner_id, id)?;
        category.ensure_mutable()?;

        if let Some(target) = move_to {
            if target == id {
                return Err(ApplicationError::Validation(
                    "cannot move bookmarks into the category being deleted".to_string(),
                ));
            }
            match self.categories.get_by_id(target)? {
                None => return Err(ApplicationError::CategoryNotFound(target)),
                Some(destination) if !destination.belongs_to(owner_id) => {
                    return Err(DomainError::OwnershipViolation(
                        "target category must belong to the same user".to_string(),
                    )
                    .into())
                }
                Some(_) => {}
            }
        }

        if !self.categories.delete(owner_id, id, move_to)? {
            return Err(ApplicationError::CategoryNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn share_category(&self, owner_id: &str, id: i32) -> ApplicationResult<String> {
        let mut category = self.owned_category(owner_id, id)?;
        category.ensure_mutable()?;

        let token = category
            .share_token
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        category.share_token = Some(token.clone());
        category.is_public = true;
        category.updated_at = chrono::Utc::now();
        self.categories.update(&category)?;
        Ok(token)
    }

    #[instrument(skip_all, level = "debug")]
    fn get_shared_category(&self, token: &str) -> ApplicationResult<Category> {
        match self.categories.get_by_share_token(token.trim())? {
            Some(category) if category.is_public => Ok(category),
            _ => Err(DomainError::CategoryNotFound("no shared category for this token".to_string()).into()),
        }
    }
}
