// gmark/src/client/resolver.rs
use crate::api::dto::BookmarkDto;
use crate::client::api::ApiClient;
use crate::client::cache::{QueryCache, Subscription};
use crate::client::error::ClientResult;
use crate::client::keys::{KeyParams, Operation, QueryKey};
use crate::domain::content::ContentRef;
use crate::domain::status::{lookup_status, BookmarkStatus, StatusMap};
use itertools::Itertools;
use tracing::{instrument, trace};

/// Client front-end of the batch status lookup.
///
/// Results are cached under the item list as requested, while the request
/// itself only carries each distinct item once. An empty item list never
/// reaches the transport.
#[derive(Debug, Clone)]
pub struct BatchStatusResolver {
    api: ApiClient,
    cache: QueryCache,
}

impl BatchStatusResolver {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    /// Synchronous read. An empty list is answered without any cache entry.
    pub fn peek(&self, owner: &str, items: &[ContentRef]) -> Option<StatusMap<BookmarkDto>> {
        if items.is_empty() {
            return Some(StatusMap::new());
        }
        self.cache.peek(&QueryKey::batch_status(owner, items))
    }

    #[instrument(skip(self, items), level = "debug", fields(n = items.len()))]
    pub async fn resolve(
        &self,
        owner: &str,
        items: &[ContentRef],
    ) -> ClientResult<StatusMap<BookmarkDto>> {
        if items.is_empty() {
            trace!("empty batch");
            return Ok(StatusMap::new());
        }

        let key = QueryKey::batch_status(owner, items);
        let unique: Vec<ContentRef> = items.iter().copied().unique().collect();
        let api = self.api.clone();
        let owner = owner.to_string();
        self.cache
            .fetch(key, move || {
                let api = api.clone();
                let owner = owner.clone();
                let unique = unique.clone();
                async move { api.check_batch(&owner, &unique).await }
            })
            .await
    }

    /// Newest cached answer for one item, from its own status entry or from
    /// any batch of the same owner that asked for it. No request is made.
    pub fn cached_status(
        &self,
        owner: &str,
        content: ContentRef,
    ) -> Option<BookmarkStatus<BookmarkDto>> {
        let single = self.cache.latest(
            |key| key.is(Operation::Status, owner) && key.params == KeyParams::Item(content),
            |status: &BookmarkStatus<BookmarkDto>| Some(status.clone()),
        );
        let from_batch = self.cache.latest(
            |key| {
                key.is(Operation::BatchStatus, owner)
                    && matches!(&key.params, KeyParams::Items(items) if items.contains(&content))
            },
            |map: &StatusMap<BookmarkDto>| {
                map.contains_key(&content.status_key())
                    .then(|| lookup_status(map, &content))
            },
        );

        match (single, from_batch) {
            (Some((single_at, single)), Some((batch_at, batch))) => {
                Some(if batch_at > single_at { batch } else { single })
            }
            (single, batch) => single.or(batch).map(|(_, status)| status),
        }
    }

    pub async fn status(
        &self,
        owner: &str,
        content: ContentRef,
    ) -> ClientResult<BookmarkStatus<BookmarkDto>> {
        let api = self.api.clone();
        let owner = owner.to_string();
        self.cache
            .fetch(QueryKey::status(&owner, content), move || {
                let api = api.clone();
                let owner = owner.clone();
                async move { api.check(&owner, content).await }
            })
            .await
    }

    /// Keep the batch entry refetching in the background while subscribed
    pub fn subscribe(&self, owner: &str, items: &[ContentRef]) -> Subscription {
        self.cache.subscribe(QueryKey::batch_status(owner, items))
    }
}
