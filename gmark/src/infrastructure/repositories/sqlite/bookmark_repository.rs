// gmark/src/infrastructure/repositories/sqlite/bookmark_repository.rs

use chrono::{DateTime, SubsecRound, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Timestamp};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, error, instrument};

use super::connection::{ConnectionPool, PooledConnection};
use super::error::{is_foreign_key_violation, is_unique_violation, SqliteRepositoryError, SqliteResult};
use crate::domain::bookmark::Bookmark;
use crate::domain::content::{ContentRef, ContentSource};
use crate::domain::error::DomainResult;
use crate::domain::membership::Membership;
use crate::domain::repositories::query::{BookmarkQuery, SortDirection};
use crate::domain::repositories::repository::BookmarkRepository;
use crate::infrastructure::repositories::sqlite::model::{
    DbBookmark, DbBookmarkChanges, DbMembership, NewDbBookmark,
};
use crate::infrastructure::repositories::sqlite::schema::{bookmark_categories, bookmarks, categories};

pub const MEMBERSHIP_OWNER_MISMATCH: &str = "bookmark and category must belong to the same user";

/// Membership owner comes from the bookmark row in the same statement, so a
/// caller has no way to supply it. The composite FK on (category_id,
/// owner_id) then rejects a category of any other owner.
const INSERT_MEMBERSHIP_SQL: &str = "
    INSERT INTO bookmark_categories (bookmark_id, category_id, owner_id, position, added_at)
    SELECT b.id,
           ?,
           b.owner_id,
           COALESCE((SELECT MAX(position) + 1 FROM bookmark_categories WHERE category_id = ?), 0),
           ?
    FROM bookmarks b
    WHERE b.id = ?
";

#[derive(Clone, Debug)]
pub struct SqliteBookmarkRepository {
    pool: ConnectionPool,
}

impl SqliteBookmarkRepository {
    /// Create a new SQLite repository with the provided connection pool
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Create a new SQLite repository with the provided database URL
    #[instrument(skip_all, level = "debug")]
    pub fn from_url(database_url: &str) -> SqliteResult<Self> {
        let pool = super::connection::init_pool(database_url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Get a connection from the pool
    #[instrument(skip_all, level = "trace")]
    pub fn get_connection(&self) -> SqliteResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| SqliteRepositoryError::ConnectionPoolError(e.to_string()))
    }

    /// Convert a database model to a domain entity
    fn to_domain_model(db_bookmark: DbBookmark) -> SqliteResult<Bookmark> {
        let source = db_bookmark
            .content_source
            .parse::<ContentSource>()
            .map_err(|e| {
                SqliteRepositoryError::ConversionError(format!(
                    "Bookmark {} has unknown content source: {}",
                    db_bookmark.id, e
                ))
            })?;

        Ok(Bookmark {
            id: Some(db_bookmark.id),
            owner_id: db_bookmark.owner_id,
            content: ContentRef::new(db_bookmark.content_id, source),
            note: db_bookmark.note,
            pinned: db_bookmark.pinned,
            is_public: db_bookmark.is_public,
            created_at: DateTime::<Utc>::from_naive_utc_and_offset(db_bookmark.created_at, Utc),
            updated_at: DateTime::<Utc>::from_naive_utc_and_offset(db_bookmark.updated_at, Utc),
        })
    }

    /// Rows that fail conversion are logged and skipped rather than failing a whole listing.
    fn to_domain_models(db_bookmarks: Vec<DbBookmark>) -> Vec<Bookmark> {
        db_bookmarks
            .into_iter()
            .filter_map(|db_bookmark| match Self::to_domain_model(db_bookmark) {
                Ok(bookmark) => Some(bookmark),
                Err(e) => {
                    error!("Failed to convert bookmark: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl BookmarkRepository for SqliteBookmarkRepository {
    #[instrument(skip_all, level = "debug", fields(id = id))]
    fn get_by_id(&self, id: i32) -> DomainResult<Option<Bookmark>> {
        let mut conn = self.get_connection()?;

        let result = bookmarks::table
            .find(id)
            .select(DbBookmark::as_select())
            .first::<DbBookmark>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        match result {
            Some(db_bookmark) => Ok(Some(Self::to_domain_model(db_bookmark)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id, content = %content))]
    fn get_by_content(
        &self,
        owner_id: &str,
        content: &ContentRef,
    ) -> DomainResult<Option<Bookmark>> {
        let mut conn = self.get_connection()?;

        let result = bookmarks::table
            .filter(bookmarks::owner_id.eq(owner_id))
            .filter(bookmarks::content_id.eq(content.content_id))
            .filter(bookmarks::content_source.eq(content.source.as_str()))
            .select(DbBookmark::as_select())
            .first::<DbBookmark>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        match result {
            Some(db_bookmark) => Ok(Some(Self::to_domain_model(db_bookmark)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id, n = contents.len()))]
    fn find_by_contents(
        &self,
        owner_id: &str,
        contents: &[ContentRef],
    ) -> DomainResult<Vec<Bookmark>> {
        if contents.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection()?;

        let ids: Vec<i64> = contents.iter().map(|c| c.content_id).unique().collect();
        let sources: Vec<&str> = contents.iter().map(|c| c.source.as_str()).unique().collect();

        // (id IN ..) AND (source IN ..) over-selects across sources; the exact
        // pairs are matched below.
        let db_bookmarks = bookmarks::table
            .filter(bookmarks::owner_id.eq(owner_id))
            .filter(bookmarks::content_id.eq_any(ids))
            .filter(bookmarks::content_source.eq_any(sources))
            .select(DbBookmark::as_select())
            .load::<DbBookmark>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        let wanted: HashSet<&ContentRef> = contents.iter().collect();
        let found: Vec<Bookmark> = Self::to_domain_models(db_bookmarks)
            .into_iter()
            .filter(|bookmark| wanted.contains(&bookmark.content))
            .collect();

        debug!("Resolved {} of {} items", found.len(), wanted.len());
        Ok(found)
    }

    #[instrument(skip_all, level = "debug", fields(owner = %query.owner_id, sort = %query.sort))]
    fn list(&self, query: &BookmarkQuery) -> DomainResult<Vec<Bookmark>> {
        let mut conn = self.get_connection()?;

        let mut query_builder = bookmarks::table
            .filter(bookmarks::owner_id.eq(query.owner_id.clone()))
            .select(DbBookmark::as_select())
            .into_boxed();

        if let Some(source) = query.source {
            query_builder = query_builder.filter(bookmarks::content_source.eq(source.as_str()));
        }

        if let Some(pinned) = query.pinned {
            query_builder = query_builder.filter(bookmarks::pinned.eq(pinned));
        }

        if let Some(category_id) = query.category_id {
            query_builder = query_builder.filter(
                bookmarks::id.eq_any(
                    bookmark_categories::table
                        .filter(bookmark_categories::category_id.eq(category_id))
                        .select(bookmark_categories::bookmark_id),
                ),
            );
        }

        // Keyset pagination on (created_at, id)
        if let Some(after) = query.after {
            let ts = after.created_at.naive_utc();
            query_builder = match query.sort {
                SortDirection::Descending => query_builder.filter(
                    bookmarks::created_at
                        .lt(ts)
                        .or(bookmarks::created_at.eq(ts).and(bookmarks::id.lt(after.id))),
                ),
                SortDirection::Ascending => query_builder.filter(
                    bookmarks::created_at
                        .gt(ts)
                        .or(bookmarks::created_at.eq(ts).and(bookmarks::id.gt(after.id))),
                ),
            };
        }

        query_builder = match query.sort {
            SortDirection::Descending => {
                query_builder.order((bookmarks::created_at.desc(), bookmarks::id.desc()))
            }
            SortDirection::Ascending => {
                query_builder.order((bookmarks::created_at.asc(), bookmarks::id.asc()))
            }
        };

        let db_bookmarks = query_builder
            .limit(query.limit as i64)
            .load::<DbBookmark>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(Self::to_domain_models(db_bookmarks))
    }

    #[instrument(skip_all, level = "debug", fields(owner = %bookmark.owner_id, content = %bookmark.content))]
    fn add(&self, bookmark: &mut Bookmark) -> DomainResult<()> {
        let mut conn = self.get_connection()?;

        // Cursors carry microseconds; store exactly what a cursor can express.
        let created_at = bookmark.created_at.trunc_subsecs(6);
        let updated_at = bookmark.updated_at.trunc_subsecs(6);

        let new_bookmark = NewDbBookmark {
            owner_id: bookmark.owner_id.clone(),
            content_id: bookmark.content.content_id,
            content_source: bookmark.content.source.as_str().to_string(),
            note: bookmark.note.clone(),
            pinned: bookmark.pinned,
            is_public: bookmark.is_public,
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        };
        debug!("Inserting bookmark: {:?}", new_bookmark);

        let id = diesel::insert_into(bookmarks::table)
            .values(&new_bookmark)
            .returning(bookmarks::id)
            .get_result::<i32>(&mut conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SqliteRepositoryError::DuplicateBookmark(format!(
                        "{} is already bookmarked by {}",
                        bookmark.content, bookmark.owner_id
                    ))
                } else {
                    SqliteRepositoryError::DatabaseError(e)
                }
            })?;

        bookmark.set_id(id);
        bookmark.created_at = created_at;
        bookmark.updated_at = updated_at;
        Ok(())
    }

    #[instrument(skip_all, level = "debug", fields(id = ?bookmark.id))]
    fn update(&self, bookmark: &Bookmark) -> DomainResult<()> {
        let mut conn = self.get_connection()?;

        let id = bookmark.id.ok_or_else(|| {
            SqliteRepositoryError::OperationFailed("Bookmark has no ID".to_string())
        })?;

        let changes = DbBookmarkChanges {
            note: bookmark.note.clone(),
            pinned: bookmark.pinned,
            is_public: bookmark.is_public,
            updated_at: bookmark.updated_at.trunc_subsecs(6).naive_utc(),
        };

        let result = diesel::update(
            bookmarks::table
                .filter(bookmarks::id.eq(id))
                .filter(bookmarks::owner_id.eq(&bookmark.owner_id)),
        )
        .set(&changes)
        .execute(&mut conn)
        .map_err(SqliteRepositoryError::DatabaseError)?;

        if result == 0 {
            return Err(SqliteRepositoryError::BookmarkNotFound(id).into());
        }

        Ok(())
    }

    #[instrument(skip_all, level = "debug", fields(owner = owner_id, id = id))]
    fn delete(&self, owner_id: &str, id: i32) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        // Hard delete; bookmark_categories rows go with it (ON DELETE CASCADE)
        let deleted = diesel::delete(
            bookmarks::table
                .filter(bookmarks::id.eq(id))
                .filter(bookmarks::owner_id.eq(owner_id)),
        )
        .execute(&mut conn)
        .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(deleted > 0)
    }

    #[instrument(skip_all, level = "debug", fields(bookmark_id = bookmark_id))]
    fn memberships(&self, bookmark_id: i32) -> DomainResult<Vec<Membership>> {
        let mut conn = self.get_connection()?;

        let rows = bookmark_categories::table
            .filter(bookmark_categories::bookmark_id.eq(bookmark_id))
            .order(bookmark_categories::category_id.asc())
            .select(DbMembership::as_select())
            .load::<DbMembership>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .map(|row| Membership {
                bookmark_id: row.bookmark_id,
                category_id: row.category_id,
                owner_id: row.owner_id,
                position: row.position,
                added_at: DateTime::<Utc>::from_naive_utc_and_offset(row.added_at, Utc),
            })
            .collect())
    }

    #[instrument(skip_all, level = "debug", fields(bookmark_id = bookmark_id, categories = ?category_ids))]
    fn sync_categories(&self, bookmark_id: i32, category_ids: &[i32]) -> DomainResult<Vec<i32>> {
        let mut conn = self.get_connection()?;
        let wanted: Vec<i32> = category_ids.iter().copied().unique().collect();

        let synced = conn.transaction::<Vec<i32>, SqliteRepositoryError, _>(|conn| {
            let exists = bookmarks::table
                .find(bookmark_id)
                .select(bookmarks::id)
                .first::<i32>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(SqliteRepositoryError::BookmarkNotFound(bookmark_id));
            }

            // Missing ids are not-found; the FK below only speaks for owners.
            let known: HashSet<i32> = categories::table
                .filter(categories::id.eq_any(wanted.clone()))
                .select(categories::id)
                .load::<i32>(conn)?
                .into_iter()
                .collect();
            if let Some(missing) = wanted.iter().find(|id| !known.contains(id)) {
                return Err(SqliteRepositoryError::CategoryNotFound(*missing));
            }

            diesel::delete(
                bookmark_categories::table
                    .filter(bookmark_categories::bookmark_id.eq(bookmark_id))
                    .filter(bookmark_categories::category_id.ne_all(wanted.clone())),
            )
            .execute(conn)?;

            let existing: HashSet<i32> = bookmark_categories::table
                .filter(bookmark_categories::bookmark_id.eq(bookmark_id))
                .select(bookmark_categories::category_id)
                .load::<i32>(conn)?
                .into_iter()
                .collect();

            let now = Utc::now().trunc_subsecs(6).naive_utc();
            for category_id in wanted.iter().filter(|id| !existing.contains(id)) {
                sql_query(INSERT_MEMBERSHIP_SQL)
                    .bind::<Integer, _>(*category_id)
                    .bind::<Integer, _>(*category_id)
                    .bind::<Timestamp, _>(now)
                    .bind::<Integer, _>(bookmark_id)
                    .execute(conn)
                    .map_err(|e| {
                        if is_foreign_key_violation(&e) {
                            debug!(
                                "Rejected membership of bookmark {} in category {}",
                                bookmark_id, category_id
                            );
                            SqliteRepositoryError::OwnershipViolation(
                                MEMBERSHIP_OWNER_MISMATCH.to_string(),
                            )
                        } else {
                            SqliteRepositoryError::DatabaseError(e)
                        }
                    })?;
            }

            let synced = bookmark_categories::table
                .filter(bookmark_categories::bookmark_id.eq(bookmark_id))
                .order(bookmark_categories::category_id.asc())
                .select(bookmark_categories::category_id)
                .load::<i32>(conn)?;
            Ok(synced)
        })?;

        Ok(synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::repositories::cursor::PageCursor;
    use crate::util::testing::TestDb;

    fn add_bookmark(
        repo: &SqliteBookmarkRepository,
        owner: &str,
        content_id: i64,
        source: ContentSource,
    ) -> Bookmark {
        let mut bookmark =
            Bookmark::new(owner, ContentRef::new(content_id, source), "").unwrap();
        repo.add(&mut bookmark).unwrap();
        bookmark
    }

    #[test]
    fn test_add_and_get_by_id() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();

        let mut bookmark = Bookmark::new(
            "alice",
            ContentRef::new(1001, ContentSource::Items),
            "sunset",
        )?;
        repo.add(&mut bookmark)?;
        assert!(bookmark.id.is_some());

        let retrieved = repo.get_by_id(bookmark.id.unwrap())?.unwrap();
        assert_eq!(retrieved, bookmark);
        Ok(())
    }

    #[test]
    fn given_same_content_twice_when_add_then_duplicate_rejected() {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        add_bookmark(&repo, "alice", 1, ContentSource::Items);

        let mut again = Bookmark::new("alice", ContentRef::new(1, ContentSource::Items), "").unwrap();
        let result = repo.add(&mut again);
        assert!(matches!(result, Err(DomainError::BookmarkExists(_))));

        // same content, other source or other owner is a different bookmark
        add_bookmark(&repo, "alice", 1, ContentSource::AutoItems);
        add_bookmark(&repo, "bob", 1, ContentSource::Items);
    }

    #[test]
    fn given_deleted_bookmark_when_added_again_then_succeeds() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let first = add_bookmark(&repo, "alice", 7, ContentSource::Items);

        assert!(repo.delete("alice", first.id.unwrap())?);
        assert!(repo.get_by_id(first.id.unwrap())?.is_none());

        let second = add_bookmark(&repo, "alice", 7, ContentSource::Items);
        assert_ne!(first.id, second.id);
        Ok(())
    }

    #[test]
    fn given_other_owner_when_delete_then_nothing_deleted() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let bookmark = add_bookmark(&repo, "alice", 7, ContentSource::Items);

        assert!(!repo.delete("mallory", bookmark.id.unwrap())?);
        assert!(repo.get_by_id(bookmark.id.unwrap())?.is_some());
        Ok(())
    }

    #[test]
    fn given_mixed_sources_when_find_by_contents_then_matches_exact_pairs() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        add_bookmark(&repo, "alice", 1, ContentSource::Items);
        add_bookmark(&repo, "alice", 2, ContentSource::AutoItems);
        add_bookmark(&repo, "bob", 3, ContentSource::Items);

        let requested = vec![
            ContentRef::new(1, ContentSource::Items),
            ContentRef::new(2, ContentSource::Items),
            ContentRef::new(3, ContentSource::Items),
        ];
        let found = repo.find_by_contents("alice", &requested)?;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, ContentRef::new(1, ContentSource::Items));
        assert!(repo.find_by_contents("alice", &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn given_many_bookmarks_when_listing_with_cursor_then_pages_do_not_overlap(
    ) -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        for content_id in 0..5 {
            add_bookmark(&repo, "alice", content_id, ContentSource::Items);
        }

        let first = repo.list(&BookmarkQuery::for_owner("alice").with_limit(2))?;
        assert_eq!(first.len(), 2);
        let last = first.last().unwrap();
        let cursor = PageCursor::new(last.created_at, last.id.unwrap());

        let second = repo.list(
            &BookmarkQuery::for_owner("alice")
                .with_limit(10)
                .with_after(Some(cursor)),
        )?;
        assert_eq!(second.len(), 3);

        let first_ids: HashSet<_> = first.iter().map(|b| b.id).collect();
        assert!(second.iter().all(|b| !first_ids.contains(&b.id)));
        Ok(())
    }

    #[test]
    fn given_membership_when_bookmark_deleted_then_membership_cascades() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let category_id = db.insert_category("alice", "Cats");
        let bookmark = add_bookmark(&repo, "alice", 1, ContentSource::Items);
        let id = bookmark.id.unwrap();

        assert_eq!(repo.sync_categories(id, &[category_id])?, vec![category_id]);
        let memberships = repo.memberships(id)?;
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].owner_id, "alice");

        repo.delete("alice", id)?;
        assert!(repo.memberships(id)?.is_empty());
        Ok(())
    }

    #[test]
    fn given_foreign_category_when_sync_then_ownership_violation() {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let foreign = db.insert_category("bob", "Bob's");
        let bookmark = add_bookmark(&repo, "alice", 1, ContentSource::Items);

        let result = repo.sync_categories(bookmark.id.unwrap(), &[foreign]);
        match result {
            Err(DomainError::OwnershipViolation(msg)) => {
                assert_eq!(msg, MEMBERSHIP_OWNER_MISMATCH)
            }
            other => panic!("expected ownership violation, got {:?}", other),
        }
        assert!(repo.memberships(bookmark.id.unwrap()).unwrap().is_empty());
    }

    #[test]
    fn given_unknown_category_when_sync_then_not_found_and_memberships_kept() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let kept = db.insert_category("alice", "Kept");
        let id = add_bookmark(&repo, "alice", 1, ContentSource::Items).id.unwrap();
        repo.sync_categories(id, &[kept])?;

        let err = repo.sync_categories(id, &[9999]).unwrap_err();

        assert!(matches!(err, DomainError::CategoryNotFound(ref msg) if msg == "9999"));
        assert!(err.is_not_found());
        assert_eq!(repo.memberships(id)?.len(), 1);
        Ok(())
    }

    #[test]
    fn given_new_set_when_sync_then_replaces_memberships() -> Result<(), DomainError> {
        let db = TestDb::new();
        let repo = db.bookmark_repository();
        let a = db.insert_category("alice", "A");
        let b = db.insert_category("alice", "B");
        let c = db.insert_category("alice", "C");
        let id = add_bookmark(&repo, "alice", 1, ContentSource::Items).id.unwrap();

        repo.sync_categories(id, &[a, b])?;
        let synced = repo.sync_categories(id, &[c, b, c])?;

        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(synced, expected);
        assert!(repo.sync_categories(id, &[])?.is_empty());
        Ok(())
    }
}
