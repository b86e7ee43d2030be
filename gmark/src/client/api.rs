// gmark/src/client/api.rs
use crate::api::dto::{
    BookmarkDto, BookmarkPageDto, CategoryDto, CheckBatchRequest, CheckBatchResponse,
    CheckResponse, ContentItemDto, CreateBookmarkRequest, CreateCategoryRequest, ShareResponse,
    SyncCategoriesRequest, SyncCategoriesResponse, UpdateBookmarkRequest, UpdateCategoryRequest,
};
use crate::api::request::{ApiRequest, ListBookmarksParams};
use crate::client::error::{ClientError, ClientResult};
use crate::client::transport::Transport;
use crate::domain::content::ContentRef;
use crate::domain::status::{BookmarkStatus, StatusMap};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::instrument;

/// Typed calls over a [`Transport`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                message: response
                    .error_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| response.body.to_string()),
            });
        }
        Ok(serde_json::from_value(response.body)?)
    }

    async fn call_empty(&self, request: ApiRequest) -> ClientResult<()> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                message: response.error_message().unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }

    /// Sends the items as given; callers dedupe.
    #[instrument(skip_all, level = "debug", fields(owner = owner, n = items.len()))]
    pub async fn check_batch(
        &self,
        owner: &str,
        items: &[ContentRef],
    ) -> ClientResult<StatusMap<BookmarkDto>> {
        let response: CheckBatchResponse = self
            .call(ApiRequest::CheckBatch(CheckBatchRequest {
                user_id: owner.to_string(),
                items: items.iter().copied().map(ContentItemDto::from).collect(),
            }))
            .await?;
        Ok(response.bookmarks)
    }

    pub async fn check(
        &self,
        owner: &str,
        content: ContentRef,
    ) -> ClientResult<BookmarkStatus<BookmarkDto>> {
        let response: CheckResponse = self
            .call(ApiRequest::Check {
                user_id: owner.to_string(),
                content,
            })
            .await?;
        Ok(BookmarkStatus {
            is_bookmarked: response.bookmarked,
            bookmark: response.bookmark,
        })
    }

    pub async fn create_bookmark(&self, request: CreateBookmarkRequest) -> ClientResult<BookmarkDto> {
        self.call(ApiRequest::CreateBookmark(request)).await
    }

    pub async fn update_bookmark(
        &self,
        id: i32,
        body: UpdateBookmarkRequest,
    ) -> ClientResult<BookmarkDto> {
        self.call(ApiRequest::UpdateBookmark { id, body }).await
    }

    pub async fn delete_bookmark(&self, owner: &str, id: i32) -> ClientResult<()> {
        self.call_empty(ApiRequest::DeleteBookmark {
            id,
            user_id: owner.to_string(),
        })
        .await
    }

    pub async fn list_bookmarks(&self, params: ListBookmarksParams) -> ClientResult<BookmarkPageDto> {
        self.call(ApiRequest::ListBookmarks(params)).await
    }

    pub async fn sync_categories(
        &self,
        owner: &str,
        bookmark_id: i32,
        category_ids: Vec<i32>,
    ) -> ClientResult<Vec<i32>> {
        let response: SyncCategoriesResponse = self
            .call(ApiRequest::SyncCategories {
                bookmark_id,
                body: SyncCategoriesRequest {
                    user_id: owner.to_string(),
                    category_ids,
                },
            })
            .await?;
        Ok(response.category_ids)
    }

    pub async fn list_categories(&self, owner: &str) -> ClientResult<Vec<CategoryDto>> {
        self.call(ApiRequest::ListCategories {
            user_id: owner.to_string(),
        })
        .await
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> ClientResult<CategoryDto> {
        self.call(ApiRequest::CreateCategory(request)).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        body: UpdateCategoryRequest,
    ) -> ClientResult<CategoryDto> {
        self.call(ApiRequest::UpdateCategory { id, body }).await
    }

    pub async fn delete_category(
        &self,
        owner: &str,
        id: i32,
        move_to: Option<i32>,
    ) -> ClientResult<()> {
        self.call_empty(ApiRequest::DeleteCategory {
            id,
            user_id: owner.to_string(),
            move_to,
        })
        .await
    }

    pub async fn share_category(&self, owner: &str, id: i32) -> ClientResult<String> {
        let response: ShareResponse = self
            .call(ApiRequest::ShareCategory {
                id,
                user_id: owner.to_string(),
            })
            .await?;
        Ok(response.share_token)
    }

    pub async fn shared_category(&self, token: &str) -> ClientResult<CategoryDto> {
        self.call(ApiRequest::GetSharedCategory {
            token: token.to_string(),
        })
        .await
    }
}
