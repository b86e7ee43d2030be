// src/application/services/category_service.rs
use crate::application::error::ApplicationResult;
use crate::domain::category::{Category, CategoryPatch, CategorySummary, NewCategory};
use std::fmt::Debug;

/// Service interface for category operations. Every call is scoped to one owner.
pub trait CategoryService: Send + Sync + Debug {
    /// The owner's categories in sort order with member counts. An owner
    /// without categories gets "Uncategorized" on first listing.
    fn list_categories(&self, owner_id: &str) -> ApplicationResult<Vec<CategorySummary>>;

    fn get_category(&self, owner_id: &str, id: i32) -> ApplicationResult<Category>;

    fn create_category(&self, owner_id: &str, input: NewCategory) -> ApplicationResult<Category>;

    fn update_category(
        &self,
        owner_id: &str,
        id: i32,
        patch: CategoryPatch,
    ) -> ApplicationResult<Category>;

    /// Delete a category; with `move_to`, its bookmarks are filed there first
    fn delete_category(&self, owner_id: &str, id: i32, move_to: Option<i32>)
        -> ApplicationResult<()>;

    /// Publish the category and return its share token
    fn share_category(&self, owner_id: &str, id: i32) -> ApplicationResult<String>;

    /// A shared category by token; unpublished categories read as not found
    fn get_shared_category(&self, token: &str) -> ApplicationResult<Category>;
}
