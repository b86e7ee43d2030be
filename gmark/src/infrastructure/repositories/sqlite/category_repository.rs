// gmark/src/infrastructure/repositories/sqlite/category_repository.rs

use chrono::{DateTime, SubsecRound, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use super::connection::{ConnectionPool, PooledConnection};
use super::error::{is_foreign_key_violation, SqliteRepositoryError, SqliteResult};
use crate::domain::category::{Category, CategorySummary};
use crate::domain::error::DomainResult;
use crate::domain::repositories::repository::CategoryRepository;
use crate::infrastructure::repositories::sqlite::model::{
    CategoryCount, DbCategory, DbCategoryChanges, NewDbCategory,
};
use crate::infrastructure::repositories::sqlite::schema::{bookmarks, categories};

pub const PARENT_OWNER_MISMATCH: &str = "parent category must belong to the same user";
pub const TARGET_OWNER_MISMATCH: &str = "target category must belong to the same user";

const MEMBER_COUNTS_SQL: &str = "
    SELECT category_id, COUNT(*) AS n
    FROM bookmark_categories
    WHERE owner_id = ?
    GROUP BY category_id
";

/// Copies memberships to the target category. `OR IGNORE` skips bookmarks
/// already filed there; the composite FK still rejects a foreign target.
const MOVE_MEMBERSHIPS_SQL: &str = "
    INSERT OR IGNORE INTO bookmark_categories (bookmark_id, category_id, owner_id, position, added_at)
    SELECT bookmark_id,
           ?,
           owner_id,
           position + COALESCE((SELECT MAX(position) + 1 FROM bookmark_categories WHERE category_id = ?), 0),
           added_at
    FROM bookmark_categories
    WHERE category_id = ?
";

#[derive(Clone, Debug)]
pub struct SqliteCategoryRepository {
    pool: ConnectionPool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all, level = "debug")]
    pub fn from_url(database_url: &str) -> SqliteResult<Self> {
        let pool = super::connection::init_pool(database_url)?;
        Ok(Self { pool })
    }

    #[instrument(skip_all, level = "trace")]
    pub fn get_connection(&self) -> SqliteResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| SqliteRepositoryError::ConnectionPoolError(e.to_string()))
    }

    fn to_domain_model(db_category: DbCategory) -> Category {
        Category {
            id: Some(db_category.id),
            owner_id: db_category.owner_id,
            name: db_category.name,
            description: db_category.description,
            color: db_category.color,
            icon: db_category.icon,
            cover_bookmark_id: db_category.cover_bookmark_id,
            parent_id: db_category.parent_id,
            sort_index: db_category.sort_index,
            is_public: db_category.is_public,
            share_token: db_category.share_token,
            is_system: db_category.is_system,
            created_at: DateTime::<Utc>::from_naive_utc_and_offset(db_category.created_at, Utc),
            updated_at: DateTime::<Utc>::from_naive_utc_and_offset(db_category.updated_at, Utc),
        }
    }

    /// SQLite names no constraint in a FK failure, so look at the referenced
    /// rows to tell a foreign parent from a dangling parent or cover.
    fn map_write_error(
        conn: &mut SqliteConnection,
        category: &Category,
        e: diesel::result::Error,
    ) -> SqliteRepositoryError {
        if !is_foreign_key_violation(&e) {
            return SqliteRepositoryError::DatabaseError(e);
        }

        if let Some(parent_id) = category.parent_id {
            let parent_owner = categories::table
                .find(parent_id)
                .select(categories::owner_id)
                .first::<String>(conn)
                .optional();
            match parent_owner {
                Ok(None) => return SqliteRepositoryError::CategoryNotFound(parent_id),
                Ok(Some(owner)) if owner != category.owner_id => {
                    return SqliteRepositoryError::OwnershipViolation(
                        PARENT_OWNER_MISMATCH.to_string(),
                    )
                }
                Ok(Some(_)) => {}
                Err(lookup) => return SqliteRepositoryError::DatabaseError(lookup),
            }
        }

        if let Some(cover_id) = category.cover_bookmark_id {
            let cover = bookmarks::table
                .find(cover_id)
                .select(bookmarks::id)
                .first::<i32>(conn)
                .optional();
            match cover {
                Ok(None) => return SqliteRepositoryError::BookmarkNotFound(cover_id),
                Ok(Some(_)) => {}
                Err(lookup) => return SqliteRepositoryError::DatabaseError(lookup),
            }
        }

        SqliteRepositoryError::DatabaseError(e)
    }

    /// Target of a membership move: must exist and share the owner.
    fn check_move_target(
        conn: &mut SqliteConnection,
        owner_id: &str,
        target_id: i32,
    ) -> SqliteResult<()> {
        let target_owner = categories::table
            .find(target_id)
            .select(categories::owner_id)
            .first::<String>(conn)
            .optional()?;
        match target_owner {
            None => Err(SqliteRepositoryError::CategoryNotFound(target_id)),
            Some(owner) if owner != owner_id => Err(SqliteRepositoryError::OwnershipViolation(
                TARGET_OWNER_MISMATCH.to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    fn insert(conn: &mut SqliteConnection, category: &Category) -> SqliteResult<i32> {
        let next_index = categories::table
            .filter(categories::owner_id.eq(&category.owner_id))
            .select(diesel::dsl::max(categories::sort_index))
            .first::<Option<i32>>(conn)?
            .map_or(0, |max| max + 1);

        let new_category = NewDbCategory {
            owner_id: category.owner_id.clone(),
            name: category.name.clone(),
            description: category.description.clone(),
            color: category.color.clone(),
            icon: category.icon.clone(),
            cover_bookmark_id: category.cover_bookmark_id,
            parent_id: category.parent_id,
            sort_index: next_index,
            is_public: category.is_public,
            share_token: category.share_token.clone(),
            is_system: category.is_system,
            created_at: category.created_at.trunc_subsecs(6).naive_utc(),
            updated_at: category.updated_at.trunc_subsecs(6).naive_utc(),
        };
        debug!("Inserting category: {:?}", new_category);

        diesel::insert_into(categories::table)
            .values(&new_category)
            .returning(categories::id)
            .get_result::<i32>(conn)
            .map_err(|e| Self::map_write_error(conn, category, e))
    }

    fn find_system(conn: &mut SqliteConnection, owner_id: &str) -> SqliteResult<Option<DbCategory>> {
        Ok(categories::table
            .filter(categories::owner_id.eq(owner_id))
            .filter(categories::is_system.eq(true))
            .select(DbCategory::as_select())
            .first::<DbCategory>(conn)
            .optional()?)
    }
}

impl CategoryRepository for SqliteCategoryRepository {
    #[instrument(skip_all, level = "debug", fields(id = id))]
    fn get_by_id(&self, id: i32) -> DomainResult<Option<Category>> {
        let mut conn = self.get_connection()?;

        let result = categories::table
            .find(id)
            .select(DbCategory::as_select())
            .first::<DbCategory>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(result.map(Self::to_domain_model))
    }

    #[instrument(skip_all, level = "debug")]
    fn get_by_share_token(&self, token: &str) -> DomainResult<Option<Category>> {
        let mut conn = self.get_connection()?;

        let result = categories::table
            .filter(categories::share_token.eq(token))
            .select(DbCategory::as_select())
            .first::<DbCategory>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(result.map(Self::to_domain_model))
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id))]
    fn list_with_counts(&self, owner_id: &str) -> DomainResult<Vec<CategorySummary>> {
        let mut conn = self.get_connection()?;

        let db_categories = categories::table
            .filter(categories::owner_id.eq(owner_id))
            .order((categories::sort_index.asc(), categories::id.asc()))
            .select(DbCategory::as_select())
            .load::<DbCategory>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        let counts: HashMap<i32, i64> = sql_query(MEMBER_COUNTS_SQL)
            .bind::<Text, _>(owner_id)
            .load::<CategoryCount>(&mut conn)
            .map_err(|e| {
                error!("Failed to count category members: {}", e);
                SqliteRepositoryError::DatabaseError(e)
            })?
            .into_iter()
            .map(|row| (row.category_id, row.n))
            .collect();

        Ok(db_categories
            .into_iter()
            .map(|db_category| {
                let bookmark_count = counts.get(&db_category.id).copied().unwrap_or(0);
                CategorySummary {
                    category: Self::to_domain_model(db_category),
                    bookmark_count,
                }
            })
            .collect())
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id))]
    fn count_for_owner(&self, owner_id: &str) -> DomainResult<i64> {
        let mut conn = self.get_connection()?;

        let n = categories::table
            .filter(categories::owner_id.eq(owner_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;
        Ok(n)
    }

    #[instrument(skip_all, level = "debug", fields(owner = %category.owner_id, name = %category.name))]
    fn add(&self, category: &mut Category) -> DomainResult<()> {
        let mut conn = self.get_connection()?;

        let (id, sort_index) = conn.transaction::<_, SqliteRepositoryError, _>(|conn| {
            let id = Self::insert(conn, category)?;
            let sort_index = categories::table
                .find(id)
                .select(categories::sort_index)
                .first::<i32>(conn)?;
            Ok((id, sort_index))
        })?;

        category.set_id(id);
        category.sort_index = sort_index;
        Ok(())
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id))]
    fn ensure_uncategorized(&self, owner_id: &str) -> DomainResult<Category> {
        let mut conn = self.get_connection()?;
        let template = Category::uncategorized(owner_id)?;

        let db_category = conn.transaction::<_, SqliteRepositoryError, _>(|conn| {
            if let Some(existing) = Self::find_system(conn, owner_id)? {
                return Ok(existing);
            }
            // A concurrent creator trips the partial unique index; re-read
            // and return its row instead.
            match Self::insert(conn, &template) {
                Ok(id) => debug!("Created uncategorized category {} for {}", id, owner_id),
                Err(SqliteRepositoryError::DatabaseError(e))
                    if super::error::is_unique_violation(&e) =>
                {
                    debug!("Uncategorized category already created for {}", owner_id)
                }
                Err(e) => return Err(e),
            }
            Self::find_system(conn, owner_id)?.ok_or_else(|| {
                SqliteRepositoryError::OperationFailed(format!(
                    "uncategorized category missing for {}",
                    owner_id
                ))
            })
        })?;

        Ok(Self::to_domain_model(db_category))
    }

    #[instrument(skip_all, level = "debug", fields(id = ?category.id))]
    fn update(&self, category: &Category) -> DomainResult<()> {
        let mut conn = self.get_connection()?;

        let id = category.id.ok_or_else(|| {
            SqliteRepositoryError::OperationFailed("Category has no ID".to_string())
        })?;

        let changes = DbCategoryChanges {
            name: category.name.clone(),
            description: category.description.clone(),
            color: category.color.clone(),
            icon: category.icon.clone(),
            cover_bookmark_id: category.cover_bookmark_id,
            parent_id: category.parent_id,
            is_public: category.is_public,
            share_token: category.share_token.clone(),
            updated_at: category.updated_at.trunc_subsecs(6).naive_utc(),
        };

        let result = diesel::update(
            categories::table
                .filter(categories::id.eq(id))
                .filter(categories::owner_id.eq(&category.owner_id)),
        )
        .set(&changes)
        .execute(&mut conn)
        .map_err(|e| Self::map_write_error(&mut conn, category, e))?;

        if result == 0 {
            return Err(SqliteRepositoryError::CategoryNotFound(id).into());
        }
        Ok(())
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id, id = id, move_to = ?move_to))]
    fn delete(&self, owner_id: &str, id: i32, move_to: Option<i32>) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        let deleted = conn.transaction::<bool, SqliteRepositoryError, _>(|conn| {
            let Some(target) = categories::table
                .filter(categories::id.eq(id))
                .filter(categories::owner_id.eq(owner_id))
                .select(DbCategory::as_select())
                .first::<DbCategory>(conn)
                .optional()?
            else {
                return Ok(false);
            };

            if let Some(destination) = move_to {
                // The FK only fires when a row is copied; an empty category
                // would otherwise accept any target.
                Self::check_move_target(conn, owner_id, destination)?;
                let moved = sql_query(MOVE_MEMBERSHIPS_SQL)
                    .bind::<Integer, _>(destination)
                    .bind::<Integer, _>(destination)
                    .bind::<Integer, _>(id)
                    .execute(conn)
                    .map_err(|e| {
                        if is_foreign_key_violation(&e) {
                            SqliteRepositoryError::OwnershipViolation(
                                TARGET_OWNER_MISMATCH.to_string(),
                            )
                        } else {
                            SqliteRepositoryError::DatabaseError(e)
                        }
                    })?;
                debug!("Moved {} memberships to category {}", moved, destination);
            }

            // Children move up one level; the composite parent FK cannot
            // null only the parent half of the key.
            let reparented = diesel::update(
                categories::table
                    .filter(categories::parent_id.eq(id))
                    .filter(categories::owner_id.eq(owner_id)),
            )
            .set(categories::parent_id.eq(target.parent_id))
            .execute(conn)?;
            debug!("Reparented {} child categories", reparented);

            diesel::delete(categories::table.filter(categories::id.eq(id))).execute(conn)?;
            Ok(true)
        })?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bookmark::Bookmark;
    use crate::domain::category::{NewCategory, UNCATEGORIZED_NAME};
    use crate::domain::content::{ContentRef, ContentSource};
    use crate::domain::error::DomainError;
    use crate::domain::repositories::repository::BookmarkRepository;
    use crate::util::testing::TestDb;

    fn new_category(owner: &str, name: &str, parent_id: Option<i32>) -> Category {
        Category::new(
            owner,
            NewCategory {
                name: name.to_string(),
                parent_id,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn given_categories_when_added_then_sort_index_increments() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();

        let mut first = new_category("alice", "A", None);
        let mut second = new_category("alice", "B", None);
        let mut other = new_category("bob", "C", None);
        repo.add(&mut first)?;
        repo.add(&mut second)?;
        repo.add(&mut other)?;

        assert_eq!(first.sort_index, 0);
        assert_eq!(second.sort_index, 1);
        assert_eq!(other.sort_index, 0);
        assert_eq!(repo.count_for_owner("alice")?, 2);
        Ok(())
    }

    #[test]
    fn given_foreign_parent_when_added_then_ownership_violation() {
        let db = TestDb::new();
        let repo = db.category_repository();
        let mut bobs = new_category("bob", "Bob's", None);
        repo.add(&mut bobs).unwrap();

        let mut child = new_category("alice", "Child", bobs.id);
        match repo.add(&mut child) {
            Err(DomainError::OwnershipViolation(msg)) => assert_eq!(msg, PARENT_OWNER_MISMATCH),
            other => panic!("expected ownership violation, got {:?}", other),
        }
        assert_eq!(repo.count_for_owner("alice").unwrap(), 0);
    }

    #[test]
    fn given_repeated_calls_when_ensure_uncategorized_then_single_row() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();

        let first = repo.ensure_uncategorized("alice")?;
        let second = repo.ensure_uncategorized("alice")?;

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, UNCATEGORIZED_NAME);
        assert!(first.is_system);
        assert_eq!(repo.count_for_owner("alice")?, 1);
        Ok(())
    }

    #[test]
    fn given_members_when_listing_then_counts_are_attached() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let bookmarks = db.bookmark_repository();

        let mut cats = new_category("alice", "Cats", None);
        let mut dogs = new_category("alice", "Dogs", None);
        repo.add(&mut cats)?;
        repo.add(&mut dogs)?;

        for content_id in 1..=3 {
            let mut bookmark =
                Bookmark::new("alice", ContentRef::new(content_id, ContentSource::Items), "")?;
            bookmarks.add(&mut bookmark)?;
            bookmarks.sync_categories(bookmark.id.unwrap(), &[cats.id.unwrap()])?;
        }

        let summaries = repo.list_with_counts("alice")?;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].category.name, "Cats");
        assert_eq!(summaries[0].bookmark_count, 3);
        assert_eq!(summaries[1].bookmark_count, 0);
        Ok(())
    }

    #[test]
    fn given_move_to_when_deleting_then_memberships_and_children_move() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let bookmarks = db.bookmark_repository();

        let mut root = new_category("alice", "Root", None);
        repo.add(&mut root)?;
        let mut doomed = new_category("alice", "Doomed", root.id);
        repo.add(&mut doomed)?;
        let mut child = new_category("alice", "Child", doomed.id);
        repo.add(&mut child)?;
        let mut keeper = new_category("alice", "Keeper", None);
        repo.add(&mut keeper)?;

        let mut bookmark = Bookmark::new("alice", ContentRef::new(1, ContentSource::Items), "")?;
        bookmarks.add(&mut bookmark)?;
        let bookmark_id = bookmark.id.unwrap();
        bookmarks.sync_categories(bookmark_id, &[doomed.id.unwrap()])?;

        assert!(repo.delete("alice", doomed.id.unwrap(), keeper.id)?);

        let members: Vec<i32> = bookmarks
            .memberships(bookmark_id)?
            .into_iter()
            .map(|m| m.category_id)
            .collect();
        assert_eq!(members, vec![keeper.id.unwrap()]);

        let child = repo.get_by_id(child.id.unwrap())?.unwrap();
        assert_eq!(child.parent_id, root.id);
        Ok(())
    }

    #[test]
    fn given_foreign_target_when_deleting_then_nothing_changes() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let bookmarks = db.bookmark_repository();

        let mut mine = new_category("alice", "Mine", None);
        repo.add(&mut mine)?;
        let mut theirs = new_category("bob", "Theirs", None);
        repo.add(&mut theirs)?;

        let mut bookmark = Bookmark::new("alice", ContentRef::new(1, ContentSource::Items), "")?;
        bookmarks.add(&mut bookmark)?;
        bookmarks.sync_categories(bookmark.id.unwrap(), &[mine.id.unwrap()])?;

        let result = repo.delete("alice", mine.id.unwrap(), theirs.id);
        assert!(matches!(result, Err(DomainError::OwnershipViolation(_))));
        assert!(repo.get_by_id(mine.id.unwrap())?.is_some());
        assert_eq!(bookmarks.memberships(bookmark.id.unwrap())?.len(), 1);
        Ok(())
    }

    #[test]
    fn given_empty_category_and_foreign_target_when_deleting_then_rejected() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();

        let mut empty = new_category("alice", "Empty", None);
        repo.add(&mut empty)?;
        let mut theirs = new_category("bob", "Theirs", None);
        repo.add(&mut theirs)?;

        match repo.delete("alice", empty.id.unwrap(), theirs.id) {
            Err(DomainError::OwnershipViolation(msg)) => assert_eq!(msg, TARGET_OWNER_MISMATCH),
            other => panic!("expected ownership violation, got {:?}", other),
        }
        assert!(repo.get_by_id(empty.id.unwrap())?.is_some());

        let missing = repo.delete("alice", empty.id.unwrap(), Some(9999));
        assert!(matches!(missing, Err(DomainError::CategoryNotFound(_))));
        Ok(())
    }

    #[test]
    fn given_dangling_cover_when_added_then_bookmark_not_found() {
        let db = TestDb::new();
        let repo = db.category_repository();

        let mut category = new_category("alice", "Covered", None);
        category.cover_bookmark_id = Some(4242);

        let err = repo.add(&mut category).unwrap_err();
        assert!(
            matches!(err, DomainError::BookmarkNotFound(ref id) if id == "4242"),
            "expected missing cover, got {:?}",
            err
        );
        assert_eq!(repo.count_for_owner("alice").unwrap(), 0);
    }

    #[test]
    fn given_missing_parent_when_updated_then_category_not_found() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let mut category = new_category("alice", "Orphan", None);
        repo.add(&mut category)?;

        category.parent_id = Some(777);
        let err = repo.update(&category).unwrap_err();

        assert!(matches!(err, DomainError::CategoryNotFound(ref id) if id == "777"));
        assert!(!err.is_validation());
        Ok(())
    }

    #[test]
    fn given_other_owner_when_deleting_then_returns_false() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let mut mine = new_category("alice", "Mine", None);
        repo.add(&mut mine)?;

        assert!(!repo.delete("mallory", mine.id.unwrap(), None)?);
        assert!(repo.get_by_id(mine.id.unwrap())?.is_some());
        Ok(())
    }

    #[test]
    fn given_share_token_when_updated_then_found_by_token() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.category_repository();
        let mut category = new_category("alice", "Shared", None);
        repo.add(&mut category)?;

        category.share_token = Some("tok-123".to_string());
        repo.update(&category)?;

        let found = repo.get_by_share_token("tok-123")?.unwrap();
        assert_eq!(found.id, category.id);
        assert!(repo.get_by_share_token("nope")?.is_none());
        Ok(())
    }
}
