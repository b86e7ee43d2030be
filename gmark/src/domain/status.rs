// gmark/src/domain/status.rs
use crate::domain::content::ContentRef;
use std::collections::BTreeMap;

/// Result of a batch status lookup: one entry per distinct requested item,
/// keyed by [`ContentRef::status_key`]. `None` means "not bookmarked".
pub type StatusMap<B> = BTreeMap<String, Option<B>>;

/// "Is this item bookmarked" as a plain value. Not being bookmarked is the
/// common case and is never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkStatus<B> {
    pub is_bookmarked: bool,
    pub bookmark: Option<B>,
}

impl<B> BookmarkStatus<B> {
    pub fn not_bookmarked() -> Self {
        Self {
            is_bookmarked: false,
            bookmark: None,
        }
    }

    pub fn bookmarked(bookmark: B) -> Self {
        Self {
            is_bookmarked: true,
            bookmark: Some(bookmark),
        }
    }
}

impl<B> From<Option<B>> for BookmarkStatus<B> {
    fn from(bookmark: Option<B>) -> Self {
        match bookmark {
            Some(b) => Self::bookmarked(b),
            None => Self::not_bookmarked(),
        }
    }
}

/// Derive the single-item status from a batch result. Items missing from the
/// map read as not bookmarked.
pub fn lookup_status<B: Clone>(map: &StatusMap<B>, content: &ContentRef) -> BookmarkStatus<B> {
    map.get(&content.status_key())
        .cloned()
        .flatten()
        .into()
}

/// Build a complete status map: every requested item gets a key, matched
/// bookmarks fill their slot. Duplicate requests collapse into one key.
pub fn complete_status_map<B, I>(
    requested: &[ContentRef],
    found: I,
    key_of: impl Fn(&B) -> String,
) -> StatusMap<B>
where
    I: IntoIterator<Item = B>,
{
    let mut map: StatusMap<B> = requested
        .iter()
        .map(|content| (content.status_key(), None))
        .collect();
    for bookmark in found {
        if let Some(slot) = map.get_mut(&key_of(&bookmark)) {
            *slot = Some(bookmark);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentSource;

    #[test]
    fn given_batch_result_when_lookup_then_derives_single_status() {
        let mut map: StatusMap<&str> = StatusMap::new();
        map.insert("1001-items".to_string(), Some("bm-1001"));
        map.insert("1002-items".to_string(), None);

        let found = lookup_status(&map, &ContentRef::new(1001, ContentSource::Items));
        assert_eq!(found, BookmarkStatus::bookmarked("bm-1001"));

        let absent = lookup_status(&map, &ContentRef::new(1002, ContentSource::Items));
        assert!(!absent.is_bookmarked);
        assert_eq!(absent.bookmark, None);

        let unknown = lookup_status(&map, &ContentRef::new(9, ContentSource::AutoItems));
        assert_eq!(unknown, BookmarkStatus::not_bookmarked());
    }

    #[test]
    fn given_duplicates_when_completing_then_one_key_per_item() {
        let requested = vec![
            ContentRef::new(1, ContentSource::Items),
            ContentRef::new(1, ContentSource::Items),
            ContentRef::new(1, ContentSource::AutoItems),
        ];
        let map = complete_status_map(&requested, vec!["1-auto_items".to_string()], |b| {
            b.clone()
        });

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1-items"), Some(&None));
        assert_eq!(
            map.get("1-auto_items"),
            Some(&Some("1-auto_items".to_string()))
        );
    }

    #[test]
    fn given_unrequested_bookmark_when_completing_then_ignored() {
        let requested = vec![ContentRef::new(5, ContentSource::Items)];
        let map = complete_status_map(&requested, vec!["6-items".to_string()], |b| b.clone());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("5-items"), Some(&None));
    }
}
