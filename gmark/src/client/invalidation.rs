// gmark/src/client/invalidation.rs
use crate::client::cache::{InvalidationReport, QueryCache};
use crate::client::keys::{KeyParams, Operation, QueryKey};
use crate::domain::content::ContentRef;
use tracing::{debug, instrument};

/// A successful write, described by what it touched
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    BookmarkCreated { owner: String, content: ContentRef },
    BookmarkDeleted { owner: String, content: ContentRef },
    BookmarkUpdated { owner: String, content: ContentRef },
    CategoriesSynced { owner: String },
    CategoryChanged { owner: String },
}

impl Mutation {
    pub fn owner(&self) -> &str {
        match self {
            Mutation::BookmarkCreated { owner, .. }
            | Mutation::BookmarkDeleted { owner, .. }
            | Mutation::BookmarkUpdated { owner, .. }
            | Mutation::CategoriesSynced { owner }
            | Mutation::CategoryChanged { owner } => owner,
        }
    }

    /// Whether a cached result may have changed because of this mutation.
    pub fn affects(&self, key: &QueryKey) -> bool {
        let owner = self.owner();
        match self {
            Mutation::BookmarkCreated { content, .. }
            | Mutation::BookmarkDeleted { content, .. }
            | Mutation::BookmarkUpdated { content, .. } => {
                let status_hit = key.is(Operation::Status, owner)
                    && key.params == KeyParams::Item(*content);
                status_hit
                    || key.is(Operation::BatchStatus, owner)
                    || key.is(Operation::BookmarkList, owner)
            }
            // Member counts of every category list may move
            Mutation::CategoriesSynced { .. } => {
                key.is(Operation::BookmarkList, owner) || key.operation == Operation::CategoryList
            }
            Mutation::CategoryChanged { .. } => {
                key.is(Operation::CategoryList, owner) || key.is(Operation::BookmarkList, owner)
            }
        }
    }
}

/// Mark every affected entry stale. Returns without waiting for refetches.
#[instrument(skip(cache), level = "debug")]
pub fn invalidate_after(cache: &QueryCache, mutation: &Mutation) -> InvalidationReport {
    let report = cache.invalidate(|key| mutation.affects(key));
    debug!(
        "{} keys scheduled, {} deferred",
        report.scheduled.len(),
        report.deferred.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::ListBookmarksParams;
    use crate::domain::content::ContentSource;

    fn item(id: i64) -> ContentRef {
        ContentRef::new(id, ContentSource::Items)
    }

    #[test]
    fn given_bookmark_created_then_only_that_owners_keys_hit() {
        let mutation = Mutation::BookmarkCreated {
            owner: "alice".to_string(),
            content: item(1),
        };

        assert!(mutation.affects(&QueryKey::status("alice", item(1))));
        assert!(!mutation.affects(&QueryKey::status("alice", item(2))));
        assert!(!mutation.affects(&QueryKey::status("bob", item(1))));
        assert!(mutation.affects(&QueryKey::batch_status("alice", &[item(7), item(8)])));
        assert!(!mutation.affects(&QueryKey::batch_status("bob", &[item(1)])));
        assert!(mutation.affects(&QueryKey::bookmark_list(&ListBookmarksParams::for_user(
            "alice"
        ))));
        assert!(!mutation.affects(&QueryKey::category_list("alice")));
    }

    #[test]
    fn given_categories_synced_then_all_category_lists_hit() {
        let mutation = Mutation::CategoriesSynced {
            owner: "alice".to_string(),
        };

        assert!(mutation.affects(&QueryKey::category_list("alice")));
        assert!(mutation.affects(&QueryKey::category_list("bob")));
        assert!(mutation.affects(&QueryKey::bookmark_list(&ListBookmarksParams::for_user(
            "alice"
        ))));
        assert!(!mutation.affects(&QueryKey::bookmark_list(&ListBookmarksParams::for_user(
            "bob"
        ))));
        assert!(!mutation.affects(&QueryKey::status("alice", item(1))));
    }

    #[test]
    fn given_category_changed_then_lists_of_owner_hit() {
        let mutation = Mutation::CategoryChanged {
            owner: "alice".to_string(),
        };

        assert!(mutation.affects(&QueryKey::category_list("alice")));
        assert!(!mutation.affects(&QueryKey::category_list("bob")));
        assert!(mutation.affects(&QueryKey::bookmark_list(&ListBookmarksParams::for_user(
            "alice"
        ))));
        assert!(!mutation.affects(&QueryKey::batch_status("alice", &[item(1)])));
    }

    #[test]
    fn given_unsubscribed_entries_then_all_deferred() {
        let cache = QueryCache::default();
        cache.set(QueryKey::status("alice", item(1)), true);
        cache.set(QueryKey::status("alice", item(2)), true);

        let report = invalidate_after(
            &cache,
            &Mutation::BookmarkDeleted {
                owner: "alice".to_string(),
                content: item(1),
            },
        );

        assert!(report.scheduled.is_empty());
        assert_eq!(report.deferred, vec![QueryKey::status("alice", item(1))]);
        assert!(cache.is_invalidated(&QueryKey::status("alice", item(1))));
        assert!(!cache.is_invalidated(&QueryKey::status("alice", item(2))));
    }
}
