use gmark::api::dto::CreateBookmarkRequest;
use gmark::api::request::ListBookmarksParams;
use gmark::client::pagination::{CursorCache, PageNumber};
use gmark::client::transport::LocalTransport;
use gmark::client::GalleryClient;
use gmark::config::Settings;
use gmark::domain::content::{ContentRef, ContentSource};
use gmark::domain::repositories::query::SortDirection;
use gmark::infrastructure::di::ServiceContainer;
use gmark::util::testing::TestDb;
use rstest::rstest;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Filters {
    owner: String,
    pinned: Option<bool>,
    sort: SortDirection,
}

fn filters(owner: &str) -> Filters {
    Filters {
        owner: owner.to_string(),
        pinned: None,
        sort: SortDirection::Descending,
    }
}

#[rstest]
#[case(PageNumber::from(0i64))]
#[case(PageNumber::from(-1i64))]
#[case(PageNumber::from(f64::NAN))]
#[case(PageNumber::from(f64::NEG_INFINITY))]
#[case(PageNumber::from(2.5f64))]
fn given_invalid_page_then_no_cursor(#[case] page: PageNumber) {
    let mut cache = CursorCache::with_filters(filters("alice"));
    cache.set_cursor(1u32, "first");
    cache.set_cursor(page, "ignored");

    assert_eq!(cache.get_cursor(page), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn given_unset_page_then_no_cursor() {
    let mut cache = CursorCache::with_filters(filters("alice"));
    cache.set_cursor(2u32, "c2");

    assert_eq!(cache.get_cursor(2u32), Some("c2"));
    assert_eq!(cache.get_cursor(3u32), None);
    assert_eq!(cache.get_cursor(1i32), None);
}

#[test]
fn given_equal_filters_then_cursors_kept() {
    let mut cache = CursorCache::with_filters(filters("alice"));
    cache.set_cursor(2u32, "c2");

    assert!(!cache.update_filters(filters("alice")));
    assert_eq!(cache.get_cursor(2u32), Some("c2"));
}

#[test]
fn given_changed_filters_then_cursors_cleared() {
    let mut cache = CursorCache::with_filters(filters("alice"));
    cache.set_cursor(2u32, "c2");
    cache.set_cursor(3u32, "c3");

    let pinned = Filters {
        pinned: Some(true),
        ..filters("alice")
    };
    assert!(cache.update_filters(pinned.clone()));
    assert!(cache.is_empty());
    assert_eq!(cache.filters(), Some(&pinned));
}

#[test]
fn given_two_caches_for_same_owner_then_independent() {
    let mut first = CursorCache::with_filters(filters("alice"));
    let mut second = CursorCache::with_filters(filters("alice"));

    first.set_cursor(2u32, "from-first");
    assert_eq!(second.get_cursor(2u32), None);

    second.set_cursor(2u32, "from-second");
    second.clear_cache();
    assert_eq!(first.get_cursor(2u32), Some("from-first"));
}

#[tokio::test]
async fn given_remembered_cursors_then_pages_revisited_by_number() {
    let db = TestDb::new();
    let handler = ServiceContainer::with_pool(db.pool(), &Settings::default()).api_handler();
    let gallery = GalleryClient::new(Arc::new(LocalTransport::new(Arc::new(handler))));
    for id in 1..=5 {
        gallery
            .add_bookmark(CreateBookmarkRequest::new(
                "alice",
                ContentRef::new(id, ContentSource::Items),
            ))
            .await
            .unwrap();
    }

    let mut cursors = CursorCache::with_filters(filters("alice"));
    let params = |cursor: Option<&str>| ListBookmarksParams {
        cursor: cursor.map(str::to_string),
        limit: Some(2),
        ..ListBookmarksParams::for_user("alice")
    };

    let mut seen = Vec::new();
    let mut page = 1u32;
    loop {
        let cursor = cursors.get_cursor(page).map(str::to_string);
        let result = gallery.bookmarks(params(cursor.as_deref())).await.unwrap();
        seen.extend(result.items.iter().map(|b| b.content_id));
        match result.next_cursor {
            Some(next) => cursors.set_cursor(page + 1, next),
            None => break,
        }
        page += 1;
    }

    assert_eq!(page, 3);
    assert_eq!(seen.len(), 5);
    seen.sort();
    seen.dedup();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);

    let again = gallery
        .bookmarks(params(cursors.get_cursor(3u32)))
        .await
        .unwrap();
    assert_eq!(again.items.len(), 1);
    assert_eq!(again.next_cursor, None);
}
