// gmark/src/client/gallery.rs
use crate::api::dto::{
    BookmarkDto, BookmarkPageDto, CategoryDto, CreateBookmarkRequest, CreateCategoryRequest,
    UpdateBookmarkRequest, UpdateCategoryRequest,
};
use crate::api::request::ListBookmarksParams;
use crate::client::api::ApiClient;
use crate::client::cache::QueryCache;
use crate::client::error::ClientResult;
use crate::client::invalidation::{invalidate_after, Mutation};
use crate::client::keys::QueryKey;
use crate::client::optimistic::OptimisticStatus;
use crate::client::resolver::BatchStatusResolver;
use crate::client::transport::Transport;
use crate::domain::content::ContentRef;
use crate::domain::status::{BookmarkStatus, StatusMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One gallery page: the listing plus the status of the items shown next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryPage {
    pub bookmarks: BookmarkPageDto,
    pub statuses: StatusMap<BookmarkDto>,
}

/// What a gallery view talks to. Reads go through the cache, writes go to
/// the server and then invalidate what they touched.
#[derive(Debug, Clone)]
pub struct GalleryClient {
    api: ApiClient,
    cache: QueryCache,
    resolver: BatchStatusResolver,
    optimistic: OptimisticStatus,
}

impl GalleryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_cache(transport, QueryCache::default())
    }

    pub fn with_cache(transport: Arc<dyn Transport>, cache: QueryCache) -> Self {
        let api = ApiClient::new(transport);
        Self {
            resolver: BatchStatusResolver::new(api.clone(), cache.clone()),
            api,
            cache,
            optimistic: OptimisticStatus::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn resolver(&self) -> &BatchStatusResolver {
        &self.resolver
    }

    pub fn optimistic(&self) -> &OptimisticStatus {
        &self.optimistic
    }

    pub async fn bookmarks(&self, params: ListBookmarksParams) -> ClientResult<BookmarkPageDto> {
        let api = self.api.clone();
        self.cache
            .fetch(QueryKey::bookmark_list(&params), move || {
                let api = api.clone();
                let params = params.clone();
                async move { api.list_bookmarks(params).await }
            })
            .await
    }

    pub async fn categories(&self, owner: &str) -> ClientResult<Vec<CategoryDto>> {
        let api = self.api.clone();
        let owner = owner.to_string();
        self.cache
            .fetch(QueryKey::category_list(&owner), move || {
                let api = api.clone();
                let owner = owner.clone();
                async move { api.list_categories(&owner).await }
            })
            .await
    }

    /// Listing and batch status of `items` are fetched concurrently.
    #[instrument(skip_all, level = "debug", fields(owner = %params.user_id, n = items.len()))]
    pub async fn page(
        &self,
        params: ListBookmarksParams,
        items: &[ContentRef],
    ) -> ClientResult<GalleryPage> {
        let owner = params.user_id.clone();
        let (bookmarks, statuses) =
            tokio::join!(self.bookmarks(params), self.resolver.resolve(&owner, items));
        Ok(GalleryPage {
            bookmarks: bookmarks?,
            statuses: statuses?,
        })
    }

    /// Server status of one item. A confirmed optimistic change is settled
    /// once the server has been read.
    pub async fn status(
        &self,
        owner: &str,
        content: ContentRef,
    ) -> ClientResult<BookmarkStatus<BookmarkDto>> {
        let status = self.resolver.status(owner, content).await?;
        self.optimistic.settle(owner, content);
        Ok(status)
    }

    /// What to show for an item right now, without any request. Batch
    /// results count as much as single-item lookups.
    pub fn is_bookmarked(&self, owner: &str, content: ContentRef) -> bool {
        let cached = self
            .resolver
            .cached_status(owner, content)
            .map(|status| status.is_bookmarked);
        self.optimistic.project(owner, content, cached)
    }

    #[instrument(skip_all, level = "debug", fields(owner = %request.user_id))]
    pub async fn add_bookmark(&self, request: CreateBookmarkRequest) -> ClientResult<BookmarkDto> {
        let owner = request.user_id.clone();
        let content = request.content();
        let ticket = self.optimistic.apply(&owner, content, true);

        match self.api.create_bookmark(request).await {
            Ok(bookmark) => {
                self.optimistic.confirm(&ticket);
                invalidate_after(
                    &self.cache,
                    &Mutation::BookmarkCreated {
                        owner: owner.clone(),
                        content,
                    },
                );
                self.cache.set(
                    QueryKey::status(&owner, content),
                    BookmarkStatus::bookmarked(bookmark.clone()),
                );
                Ok(bookmark)
            }
            Err(e) => {
                debug!("Rolling back optimistic add of {}: {}", content, e);
                self.optimistic.rollback(&ticket);
                Err(e)
            }
        }
    }

    #[instrument(skip_all, level = "debug", fields(owner = %bookmark.user_id, id = bookmark.id))]
    pub async fn remove_bookmark(&self, bookmark: &BookmarkDto) -> ClientResult<()> {
        let owner = bookmark.user_id.as_str();
        let content = bookmark.content();
        let ticket = self.optimistic.apply(owner, content, false);

        match self.api.delete_bookmark(owner, bookmark.id).await {
            Ok(()) => {
                self.optimistic.confirm(&ticket);
                invalidate_after(
                    &self.cache,
                    &Mutation::BookmarkDeleted {
                        owner: owner.to_string(),
                        content,
                    },
                );
                self.cache.set(
                    QueryKey::status(owner, content),
                    BookmarkStatus::<BookmarkDto>::not_bookmarked(),
                );
                Ok(())
            }
            Err(e) => {
                debug!("Rolling back optimistic removal of {}: {}", content, e);
                self.optimistic.rollback(&ticket);
                Err(e)
            }
        }
    }

    pub async fn update_bookmark(
        &self,
        id: i32,
        body: UpdateBookmarkRequest,
    ) -> ClientResult<BookmarkDto> {
        let bookmark = self.api.update_bookmark(id, body).await?;
        invalidate_after(
            &self.cache,
            &Mutation::BookmarkUpdated {
                owner: bookmark.user_id.clone(),
                content: bookmark.content(),
            },
        );
        Ok(bookmark)
    }

    pub async fn sync_categories(
        &self,
        owner: &str,
        bookmark_id: i32,
        category_ids: Vec<i32>,
    ) -> ClientResult<Vec<i32>> {
        let assigned = self
            .api
            .sync_categories(owner, bookmark_id, category_ids)
            .await?;
        invalidate_after(
            &self.cache,
            &Mutation::CategoriesSynced {
                owner: owner.to_string(),
            },
        );
        Ok(assigned)
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> ClientResult<CategoryDto> {
        let owner = request.user_id.clone();
        let category = self.api.create_category(request).await?;
        self.categories_changed(owner);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i32,
        body: UpdateCategoryRequest,
    ) -> ClientResult<CategoryDto> {
        let owner = body.user_id.clone();
        let category = self.api.update_category(id, body).await?;
        self.categories_changed(owner);
        Ok(category)
    }

    pub async fn delete_category(
        &self,
        owner: &str,
        id: i32,
        move_to: Option<i32>,
    ) -> ClientResult<()> {
        self.api.delete_category(owner, id, move_to).await?;
        self.categories_changed(owner.to_string());
        Ok(())
    }

    pub async fn share_category(&self, owner: &str, id: i32) -> ClientResult<String> {
        let token = self.api.share_category(owner, id).await?;
        self.categories_changed(owner.to_string());
        Ok(token)
    }

    fn categories_changed(&self, owner: String) {
        invalidate_after(&self.cache, &Mutation::CategoryChanged { owner });
    }
}
