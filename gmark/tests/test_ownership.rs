use gmark::application::error::ApplicationError;
use gmark::application::services::bookmark_service::NewBookmark;
use gmark::config::Settings;
use gmark::domain::category::{CategoryPatch, NewCategory};
use gmark::domain::content::{ContentRef, ContentSource};
use gmark::domain::error::DomainError;
use gmark::domain::repositories::repository::{BookmarkRepository, CategoryRepository};
use gmark::infrastructure::di::ServiceContainer;
use gmark::util::testing::TestDb;
use rstest::rstest;

fn container(db: &TestDb) -> ServiceContainer {
    ServiceContainer::with_pool(db.pool(), &Settings::default())
}

fn named(name: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        ..Default::default()
    }
}

fn assert_ownership_violation(err: ApplicationError) {
    assert!(err.is_validation(), "expected validation error, got {}", err);
    assert!(
        matches!(err, ApplicationError::Domain(DomainError::OwnershipViolation(_))),
        "expected ownership violation, got {:?}",
        err
    );
}

#[rstest]
#[case("alice", "bob")]
#[case("bob", "alice")]
#[case("user-1", "user-10")]
#[case("Alice", "alice")]
fn given_foreign_category_when_assigned_then_rejected(#[case] owner: &str, #[case] other: &str) {
    let db = TestDb::new();
    let services = container(&db);
    let bookmark = services
        .bookmark_service
        .add_bookmark(
            owner,
            NewBookmark::for_content(ContentRef::new(1, ContentSource::Items)),
        )
        .unwrap();
    let mine = services
        .category_service
        .create_category(owner, named("mine"))
        .unwrap();
    let theirs = services
        .category_service
        .create_category(other, named("theirs"))
        .unwrap();
    let bookmark_id = bookmark.id.unwrap();

    let err = services
        .bookmark_service
        .sync_categories(owner, bookmark_id, &[mine.id.unwrap(), theirs.id.unwrap()])
        .unwrap_err();
    assert_ownership_violation(err);

    // Nothing of the rejected set was written
    assert!(services
        .bookmark_repository
        .memberships(bookmark_id)
        .unwrap()
        .is_empty());

    let assigned = services
        .bookmark_service
        .sync_categories(owner, bookmark_id, &[mine.id.unwrap()])
        .unwrap();
    assert_eq!(assigned, vec![mine.id.unwrap()]);
}

#[test]
fn given_foreign_parent_when_created_then_rejected() {
    let db = TestDb::new();
    let services = container(&db);
    let theirs = services
        .category_service
        .create_category("bob", named("theirs"))
        .unwrap();

    let err = services
        .category_service
        .create_category(
            "alice",
            NewCategory {
                parent_id: theirs.id,
                ..named("child")
            },
        )
        .unwrap_err();

    assert_ownership_violation(err);
    assert_eq!(services.category_repository.count_for_owner("alice").unwrap(), 0);
}

#[test]
fn given_foreign_parent_when_updated_then_rejected() {
    let db = TestDb::new();
    let services = container(&db);
    let mine = services
        .category_service
        .create_category("alice", named("mine"))
        .unwrap();
    let theirs = services
        .category_service
        .create_category("bob", named("theirs"))
        .unwrap();

    let err = services
        .category_service
        .update_category(
            "alice",
            mine.id.unwrap(),
            CategoryPatch {
                parent_id: Some(theirs.id),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert_ownership_violation(err);
    let stored = services
        .category_service
        .get_category("alice", mine.id.unwrap())
        .unwrap();
    assert_eq!(stored.parent_id, None);
}

#[test]
fn given_foreign_move_target_when_deleting_then_category_kept() {
    let db = TestDb::new();
    let services = container(&db);
    let mine = services
        .category_service
        .create_category("alice", named("mine"))
        .unwrap();
    let theirs = services
        .category_service
        .create_category("bob", named("theirs"))
        .unwrap();

    let err = services
        .category_service
        .delete_category("alice", mine.id.unwrap(), theirs.id)
        .unwrap_err();

    assert_ownership_violation(err);
    assert!(services
        .category_service
        .get_category("alice", mine.id.unwrap())
        .is_ok());
}

#[test]
fn given_deleted_bookmark_then_content_can_be_bookmarked_again() {
    let db = TestDb::new();
    let services = container(&db);
    let content = ContentRef::new(42, ContentSource::AutoItems);
    let first = services
        .bookmark_service
        .add_bookmark("alice", NewBookmark::for_content(content))
        .unwrap();

    let err = services
        .bookmark_service
        .add_bookmark("alice", NewBookmark::for_content(content))
        .unwrap_err();
    assert!(err.is_conflict());

    services
        .bookmark_service
        .delete_bookmark("alice", first.id.unwrap())
        .unwrap();
    let second = services
        .bookmark_service
        .add_bookmark("alice", NewBookmark::for_content(content))
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(services
        .bookmark_service
        .check_status("alice", &content)
        .unwrap()
        .is_bookmarked);
}
