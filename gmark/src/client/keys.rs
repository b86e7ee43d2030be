// gmark/src/client/keys.rs
use crate::api::request::ListBookmarksParams;
use crate::domain::content::ContentRef;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

/// The cached operation a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Status,
    BatchStatus,
    BookmarkList,
    CategoryList,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Status => "status",
            Operation::BatchStatus => "batch_status",
            Operation::BookmarkList => "bookmark_list",
            Operation::CategoryList => "category_list",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyParams {
    None,
    Item(ContentRef),
    /// Verbatim and in request order
    Items(Vec<ContentRef>),
    Query(BTreeMap<String, String>),
}

/// Identity of one cached query result: `(operation, owner, params)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub operation: Operation,
    pub owner: String,
    pub params: KeyParams,
}

impl QueryKey {
    pub fn status(owner: &str, content: ContentRef) -> Self {
        Self {
            operation: Operation::Status,
            owner: owner.to_string(),
            params: KeyParams::Item(content),
        }
    }

    /// Keeps the item list as given: the same items in another order make
    /// another key.
    pub fn batch_status(owner: &str, items: &[ContentRef]) -> Self {
        Self {
            operation: Operation::BatchStatus,
            owner: owner.to_string(),
            params: KeyParams::Items(items.to_vec()),
        }
    }

    /// Filter parameters and cursor, normalized into an ordered map.
    pub fn bookmark_list(params: &ListBookmarksParams) -> Self {
        let mut query: BTreeMap<String, String> = params
            .filter_params()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if let Some(cursor) = &params.cursor {
            query.insert("cursor".to_string(), cursor.clone());
        }
        Self {
            operation: Operation::BookmarkList,
            owner: params.user_id.clone(),
            params: KeyParams::Query(query),
        }
    }

    pub fn category_list(owner: &str) -> Self {
        Self {
            operation: Operation::CategoryList,
            owner: owner.to_string(),
            params: KeyParams::None,
        }
    }

    pub fn is(&self, operation: Operation, owner: &str) -> bool {
        self.operation == operation && self.owner == owner
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operation, self.owner)?;
        match &self.params {
            KeyParams::None => Ok(()),
            KeyParams::Item(content) => write!(f, ":{}", content.status_key()),
            KeyParams::Items(items) => write!(
                f,
                ":[{}]",
                items.iter().map(ContentRef::status_key).join(",")
            ),
            KeyParams::Query(query) => write!(
                f,
                ":{{{}}}",
                query.iter().map(|(k, v)| format!("{}={}", k, v)).join(",")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentSource;
    use crate::domain::repositories::query::SortDirection;

    fn item(id: i64) -> ContentRef {
        ContentRef::new(id, ContentSource::Items)
    }

    #[test]
    fn given_same_items_in_other_order_then_keys_differ() {
        let ab = QueryKey::batch_status("alice", &[item(1), item(2)]);
        let ba = QueryKey::batch_status("alice", &[item(2), item(1)]);

        assert_ne!(ab, ba);
        assert_eq!(ab, QueryKey::batch_status("alice", &[item(1), item(2)]));
        assert_eq!(ab.to_string(), "batch_status:alice:[1-items,2-items]");
    }

    #[test]
    fn given_equal_list_params_then_same_key() {
        let a = ListBookmarksParams {
            pinned: Some(true),
            sort: Some(SortDirection::Ascending),
            ..ListBookmarksParams::for_user("alice")
        };
        let b = ListBookmarksParams {
            sort: Some(SortDirection::Ascending),
            pinned: Some(true),
            ..ListBookmarksParams::for_user("alice")
        };
        assert_eq!(QueryKey::bookmark_list(&a), QueryKey::bookmark_list(&b));

        let paged = ListBookmarksParams {
            cursor: Some("abc".to_string()),
            ..a.clone()
        };
        assert_ne!(QueryKey::bookmark_list(&a), QueryKey::bookmark_list(&paged));
    }

    #[test]
    fn test_owner_scoping() {
        let key = QueryKey::category_list("alice");
        assert!(key.is(Operation::CategoryList, "alice"));
        assert!(!key.is(Operation::CategoryList, "bob"));
        assert!(!key.is(Operation::BookmarkList, "alice"));
    }
}
