// gmark/src/api/handler.rs
use std::sync::Arc;

use crate::api::dto::{
    BookmarkDto, BookmarkPageDto, CategoryDto, CheckBatchResponse, CheckResponse, ErrorBody,
    ShareResponse, SyncCategoriesResponse,
};
use crate::api::request::{ApiRequest, ApiResponse, ListBookmarksParams};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::bookmark_service::{BookmarkService, NewBookmark};
use crate::application::services::category_service::CategoryService;
use crate::domain::content::ContentRef;
use crate::domain::repositories::cursor::PageCursor;
use crate::domain::repositories::query::{BookmarkQuery, DEFAULT_PAGE_SIZE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

/// Executes endpoint requests against the services and renders the
/// status code and JSON body of each.
#[derive(Debug, Clone)]
pub struct ApiHandler {
    bookmarks: Arc<dyn BookmarkService>,
    categories: Arc<dyn CategoryService>,
    page_size: usize,
}

impl ApiHandler {
    pub fn new(bookmarks: Arc<dyn BookmarkService>, categories: Arc<dyn CategoryService>) -> Self {
        Self {
            bookmarks,
            categories,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used when a listing does not ask for one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[instrument(skip_all, level = "debug", fields(request = %request))]
    pub fn handle(&self, request: ApiRequest) -> ApiResponse {
        let result = self.dispatch(request);
        match result {
            Ok(response) => response,
            Err(e) => error_response(&e),
        }
    }

    fn dispatch(&self, request: ApiRequest) -> ApplicationResult<ApiResponse> {
        match request {
            ApiRequest::CheckBatch(body) => {
                let items: Vec<ContentRef> = body.items.into_iter().map(ContentRef::from).collect();
                let map = self.bookmarks.resolve_batch_status(&body.user_id, &items)?;
                json(200, &CheckBatchResponse::from(map))
            }
            ApiRequest::Check { user_id, content } => {
                let status = self.bookmarks.check_status(&user_id, &content)?;
                json(
                    200,
                    &CheckResponse {
                        bookmarked: status.is_bookmarked,
                        bookmark: status.bookmark.map(BookmarkDto::from),
                    },
                )
            }
            ApiRequest::CreateBookmark(body) => {
                let input = NewBookmark {
                    content: body.content(),
                    note: body.note.clone().unwrap_or_default(),
                    pinned: body.pinned,
                    is_public: body.is_public,
                };
                let bookmark = self.bookmarks.add_bookmark(&body.user_id, input)?;
                json(201, &BookmarkDto::from(bookmark))
            }
            ApiRequest::UpdateBookmark { id, body } => {
                let bookmark = self
                    .bookmarks
                    .update_bookmark(&body.user_id, id, &body.patch())?;
                json(200, &BookmarkDto::from(bookmark))
            }
            ApiRequest::DeleteBookmark { id, user_id } => {
                let deleted = self.bookmarks.delete_bookmark(&user_id, id)?;
                debug!("Deleted bookmark {}", deleted);
                Ok(ApiResponse::no_content())
            }
            ApiRequest::ListBookmarks(params) => {
                let query = self.list_query(&params)?;
                let page = self.bookmarks.list_bookmarks(&query)?;
                json(200, &BookmarkPageDto::from(page))
            }
            ApiRequest::SyncCategories { bookmark_id, body } => {
                let category_ids =
                    self.bookmarks
                        .sync_categories(&body.user_id, bookmark_id, &body.category_ids)?;
                json(200, &SyncCategoriesResponse { category_ids })
            }
            ApiRequest::ListCategories { user_id } => {
                let categories: Vec<CategoryDto> = self
                    .categories
                    .list_categories(&user_id)?
                    .into_iter()
                    .map(CategoryDto::from)
                    .collect();
                json(200, &categories)
            }
            ApiRequest::CreateCategory(body) => {
                let category = self
                    .categories
                    .create_category(&body.user_id, body.to_new_category())?;
                json(201, &CategoryDto::from(category))
            }
            ApiRequest::UpdateCategory { id, body } => {
                let category = self
                    .categories
                    .update_category(&body.user_id, id, body.to_patch())?;
                json(200, &CategoryDto::from(category))
            }
            ApiRequest::DeleteCategory {
                id,
                user_id,
                move_to,
            } => {
                self.categories.delete_category(&user_id, id, move_to)?;
                Ok(ApiResponse::no_content())
            }
            ApiRequest::ShareCategory { id, user_id } => {
                let share_token = self.categories.share_category(&user_id, id)?;
                json(200, &ShareResponse { share_token })
            }
            ApiRequest::GetSharedCategory { token } => {
                let category = self.categories.get_shared_category(&token)?;
                json(200, &CategoryDto::from(category))
            }
        }
    }

    fn list_query(&self, params: &ListBookmarksParams) -> ApplicationResult<BookmarkQuery> {
        let after = params
            .cursor
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(PageCursor::decode)
            .transpose()?;

        Ok(BookmarkQuery::for_owner(params.user_id.clone())
            .with_source(params.content_source)
            .with_pinned(params.pinned)
            .with_category(params.category_id)
            .with_sort(params.sort.unwrap_or_default())
            .with_after(after)
            .with_limit(params.limit.unwrap_or(self.page_size)))
    }
}

fn json<T: Serialize>(status: u16, body: &T) -> ApplicationResult<ApiResponse> {
    let value = serde_json::to_value(body)
        .map_err(|e| ApplicationError::Other(format!("Failed to encode response: {}", e)))?;
    Ok(ApiResponse::new(status, value))
}

/// 400 validation, 404 not found, 409 conflict, 500 everything else
pub fn status_for(err: &ApplicationError) -> u16 {
    if err.is_validation() {
        400
    } else if err.is_not_found() {
        404
    } else if err.is_conflict() {
        409
    } else {
        500
    }
}

fn error_response(err: &ApplicationError) -> ApiResponse {
    let status = status_for(err);
    if status == 500 {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected ({}): {}", status, err);
    }
    let body = ErrorBody {
        error: err.reason(),
    };
    ApiResponse::new(
        status,
        serde_json::to_value(body).unwrap_or_else(|_| Value::Null),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{
        CheckBatchRequest, ContentItemDto, CreateBookmarkRequest, CreateCategoryRequest,
        SyncCategoriesRequest,
    };
    use crate::application::{BookmarkServiceImpl, CategoryServiceImpl};
    use crate::domain::content::ContentSource;
    use crate::util::testing::TestDb;
    use serde_json::json;

    fn create_handler(db: &TestDb) -> ApiHandler {
        let bookmarks = Arc::new(db.bookmark_repository());
        let categories = Arc::new(db.category_repository());
        ApiHandler::new(
            Arc::new(BookmarkServiceImpl::new(bookmarks.clone())),
            Arc::new(CategoryServiceImpl::new(categories, bookmarks)),
        )
    }

    fn create(handler: &ApiHandler, user: &str, content_id: i64) -> BookmarkDto {
        let response = handler.handle(ApiRequest::CreateBookmark(CreateBookmarkRequest::new(
            user,
            ContentRef::new(content_id, ContentSource::Items),
        )));
        assert_eq!(response.status, 201);
        serde_json::from_value(response.body).unwrap()
    }

    #[test]
    fn given_duplicate_create_then_409() {
        let db = TestDb::new();
        let handler = create_handler(&db);
        create(&handler, "alice", 1);

        let response = handler.handle(ApiRequest::CreateBookmark(CreateBookmarkRequest::new(
            "alice",
            ContentRef::new(1, ContentSource::Items),
        )));
        assert_eq!(response.status, 409);
        assert!(response.error_message().is_some());
    }

    #[test]
    fn given_batch_then_every_key_present() {
        let db = TestDb::new();
        let handler = create_handler(&db);
        let bookmark = create(&handler, "alice", 1001);

        let response = handler.handle(ApiRequest::CheckBatch(CheckBatchRequest {
            user_id: "alice".to_string(),
            items: vec![
                ContentItemDto {
                    content_id: 1001,
                    content_source_type: ContentSource::Items,
                },
                ContentItemDto {
                    content_id: 1002,
                    content_source_type: ContentSource::Items,
                },
            ],
        }));

        assert_eq!(response.status, 200);
        assert_eq!(response.body["bookmarks"]["1001-items"]["id"], json!(bookmark.id));
        assert_eq!(response.body["bookmarks"]["1002-items"], Value::Null);
        assert_eq!(response.body["bookmarks"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn given_cross_owner_sync_then_400_with_reason() {
        let db = TestDb::new();
        let handler = create_handler(&db);
        let bookmark = create(&handler, "alice", 1);
        let category = handler.handle(ApiRequest::CreateCategory(CreateCategoryRequest::named(
            "bob", "Bob's",
        )));
        let category_id = category.body["id"].as_i64().unwrap() as i32;

        let response = handler.handle(ApiRequest::SyncCategories {
            bookmark_id: bookmark.id,
            body: SyncCategoriesRequest {
                user_id: "alice".to_string(),
                category_ids: vec![category_id],
            },
        });

        assert_eq!(response.status, 400);
        assert!(response
            .error_message()
            .unwrap()
            .contains("bookmark and category must belong to the same user"));
    }

    #[test]
    fn given_unknown_category_when_sync_then_404() {
        let db = TestDb::new();
        let handler = create_handler(&db);
        let bookmark = create(&handler, "alice", 1);

        let response = handler.handle(ApiRequest::SyncCategories {
            bookmark_id: bookmark.id,
            body: SyncCategoriesRequest {
                user_id: "alice".to_string(),
                category_ids: vec![9999],
            },
        });

        assert_eq!(response.status, 404);
        assert!(!response
            .error_message()
            .unwrap()
            .contains("must belong to the same user"));
    }

    #[test]
    fn given_missing_bookmark_when_deleted_then_404() {
        let db = TestDb::new();
        let handler = create_handler(&db);

        let response = handler.handle(ApiRequest::DeleteBookmark {
            id: 42,
            user_id: "alice".to_string(),
        });
        assert_eq!(response.status, 404);

        let bookmark = create(&handler, "alice", 3);
        let response = handler.handle(ApiRequest::DeleteBookmark {
            id: bookmark.id,
            user_id: "alice".to_string(),
        });
        assert_eq!(response.status, 204);
        assert_eq!(response.body, Value::Null);
    }

    #[test]
    fn given_bad_cursor_then_400() {
        let db = TestDb::new();
        let handler = create_handler(&db);

        let response = handler.handle(ApiRequest::ListBookmarks(ListBookmarksParams {
            cursor: Some("%%%".to_string()),
            ..ListBookmarksParams::for_user("alice")
        }));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn given_unbookmarked_item_when_checked_then_200_false() {
        let db = TestDb::new();
        let handler = create_handler(&db);

        let response = handler.handle(ApiRequest::Check {
            user_id: "alice".to_string(),
            content: ContentRef::new(9, ContentSource::AutoItems),
        });
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"bookmarked": false, "bookmark": null}));
    }
}
