// gmark/src/domain/repositories/repository.rs
use crate::domain::bookmark::Bookmark;
use crate::domain::category::{Category, CategorySummary};
use crate::domain::content::ContentRef;
use crate::domain::error::DomainResult;
use crate::domain::membership::Membership;
use crate::domain::repositories::query::BookmarkQuery;

/// Persistence of bookmarks and their category memberships
pub trait BookmarkRepository: std::fmt::Debug + Send + Sync {
    /// Get a bookmark by its ID, regardless of owner
    fn get_by_id(&self, id: i32) -> DomainResult<Option<Bookmark>>;

    /// Get the owner's bookmark for one content item
    fn get_by_content(&self, owner_id: &str, content: &ContentRef)
        -> DomainResult<Option<Bookmark>>;

    /// All of the owner's bookmarks matching any of `contents`, in one query.
    /// Items without a bookmark are simply absent from the result.
    fn find_by_contents(
        &self,
        owner_id: &str,
        contents: &[ContentRef],
    ) -> DomainResult<Vec<Bookmark>>;

    /// One page of the owner's bookmarks (at most `query.limit` rows)
    fn list(&self, query: &BookmarkQuery) -> DomainResult<Vec<Bookmark>>;

    /// Insert a new bookmark and set its ID
    fn add(&self, bookmark: &mut Bookmark) -> DomainResult<()>;

    /// Update note and flags of an existing bookmark
    fn update(&self, bookmark: &Bookmark) -> DomainResult<()>;

    /// Hard-delete the owner's bookmark; memberships cascade
    fn delete(&self, owner_id: &str, id: i32) -> DomainResult<bool>;

    /// Memberships of one bookmark, ordered by category id
    fn memberships(&self, bookmark_id: i32) -> DomainResult<Vec<Membership>>;

    /// Make the bookmark's category set equal to `category_ids`.
    ///
    /// The membership owner is copied from the bookmark row at write time;
    /// a category of another owner is rejected by the store.
    fn sync_categories(&self, bookmark_id: i32, category_ids: &[i32]) -> DomainResult<Vec<i32>>;
}

/// Persistence of categories
pub trait CategoryRepository: std::fmt::Debug + Send + Sync {
    fn get_by_id(&self, id: i32) -> DomainResult<Option<Category>>;

    fn get_by_share_token(&self, token: &str) -> DomainResult<Option<Category>>;

    /// The owner's categories in sort order, each with its member count
    fn list_with_counts(&self, owner_id: &str) -> DomainResult<Vec<CategorySummary>>;

    fn count_for_owner(&self, owner_id: &str) -> DomainResult<i64>;

    /// Insert at the end of the owner's sort order and set the ID
    fn add(&self, category: &mut Category) -> DomainResult<()>;

    /// Create the owner's "Uncategorized" category unless it already exists
    fn ensure_uncategorized(&self, owner_id: &str) -> DomainResult<Category>;

    fn update(&self, category: &Category) -> DomainResult<()>;

    /// Delete the owner's category. Children move up to the deleted
    /// category's parent; with `move_to`, memberships move to that category
    /// first.
    fn delete(&self, owner_id: &str, id: i32, move_to: Option<i32>) -> DomainResult<bool>;
}
