// gmark/src/client/cache.rs
//! Keyed store of query results shared by all views of one client.
//!
//! Each entry remembers the fetcher that produced it, how many views are
//! subscribed to it and a generation counter. Invalidation bumps the
//! generation, so a response that was in flight when the entry was
//! invalidated is dropped instead of overwriting newer state.
//!
//! Concurrent reads of one key share a single fetch: the first reader runs
//! it, later readers wait on its result. Entries nobody subscribes to are
//! dropped once they have been idle for the collection window.

use crate::client::clock::{Clock, SystemClock};
use crate::client::error::{ClientError, ClientResult};
use crate::client::keys::QueryKey;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, instrument, trace};

pub type CachedValue = Arc<dyn Any + Send + Sync>;
type FetchFuture = Pin<Box<dyn Future<Output = ClientResult<CachedValue>> + Send>>;
type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;
type FetchOutcome = Option<ClientResult<CachedValue>>;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);
pub const DEFAULT_GC_AFTER: Duration = Duration::from_secs(300);

/// The fetch currently running for an entry, tagged with the generation it
/// was started under.
struct InFlight {
    generation: u64,
    outcome: watch::Receiver<FetchOutcome>,
}

impl InFlight {
    /// False once the running fetch was dropped without an outcome.
    fn is_live(&self) -> bool {
        self.outcome.borrow().is_some() || self.outcome.has_changed().is_ok()
    }
}

#[derive(Default)]
struct Entry {
    data: Option<CachedValue>,
    error: Option<ClientError>,
    updated_at: Option<Instant>,
    last_used: Option<Instant>,
    generation: u64,
    subscribers: usize,
    invalidated: bool,
    fetcher: Option<Fetcher>,
    in_flight: Option<InFlight>,
}

/// What a reader does after looking at the entry.
enum FetchRole {
    Lead(u64, watch::Sender<FetchOutcome>),
    Follow(watch::Receiver<FetchOutcome>),
}

impl Entry {
    fn is_collectable(&self, now: Instant, gc_after: Duration) -> bool {
        self.subscribers == 0
            && self.in_flight.is_none()
            && self
                .last_used
                .map_or(true, |at| now.saturating_duration_since(at) >= gc_after)
    }

    fn is_fresh(&self, now: Instant, stale_after: Duration) -> bool {
        self.data.is_some()
            && !self.invalidated
            && self
                .updated_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_after)
    }
}

/// Which keys an invalidation touched. Scheduled keys had subscribers and
/// are being refetched in the background; deferred keys are only marked and
/// refetch on their next read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvalidationReport {
    pub scheduled: Vec<QueryKey>,
    pub deferred: Vec<QueryKey>,
}

impl InvalidationReport {
    pub fn len(&self) -> usize {
        self.scheduled.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn touched(&self, key: &QueryKey) -> bool {
        self.scheduled.contains(key) || self.deferred.contains(key)
    }
}

/// Cloneable handle; clones share entries, separate instances do not.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    gc_after: Duration,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stale_after", &self.stale_after)
            .field("gc_after", &self.gc_after)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_STALE_AFTER)
    }
}

impl QueryCache {
    pub fn new(clock: Arc<dyn Clock>, stale_after: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            stale_after,
            gc_after: DEFAULT_GC_AFTER,
        }
    }

    /// How long an unsubscribed entry may sit unused before it is dropped
    pub fn with_gc_after(mut self, gc_after: Duration) -> Self {
        self.gc_after = gc_after;
        self
    }

    // A poisoned lock only means a panic elsewhere; the map itself is intact.
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached data, stale or not
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.lock();
        entries.get(key)?.data.as_ref()?.downcast_ref::<T>().cloned()
    }

    /// Store a value directly, as if a fetch had just returned it
    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.entry(key).or_default();
        entry.generation += 1;
        entry.data = Some(Arc::new(value));
        entry.error = None;
        entry.updated_at = Some(now);
        entry.last_used = Some(now);
        entry.invalidated = false;
    }

    /// Newest cached value among the keys matching `matches` for which
    /// `read` yields something, together with the time it was stored.
    pub fn latest<T, R, M, F>(&self, matches: M, read: F) -> Option<(Instant, R)>
    where
        T: 'static,
        M: Fn(&QueryKey) -> bool,
        F: Fn(&T) -> Option<R>,
    {
        let entries = self.lock();
        entries
            .iter()
            .filter(|(key, _)| matches(key))
            .filter_map(|(_, entry)| {
                let at = entry.updated_at?;
                let value = entry.data.as_ref()?.downcast_ref::<T>()?;
                read(value).map(|found| (at, found))
            })
            .max_by_key(|(at, _)| *at)
    }

    /// Drop unsubscribed entries idle for longer than the collection window.
    /// Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_collectable(now, self.gc_after));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Collected {} idle cache entries", removed);
        }
        removed
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.is_fresh(now, self.stale_after))
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.lock().get(key).is_some_and(|entry| entry.invalidated)
    }

    /// The error of the last fetch, if it failed
    pub fn error(&self, key: &QueryKey) -> Option<ClientError> {
        self.lock().get(key).and_then(|entry| entry.error.clone())
    }

    pub fn generation(&self, key: &QueryKey) -> u64 {
        self.lock().get(key).map_or(0, |entry| entry.generation)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock().get(key).map_or(0, |entry| entry.subscribers)
    }

    /// Register interest in a key until the returned guard is dropped.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        let now = self.clock.now();
        {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.subscribers += 1;
            entry.last_used = Some(now);
        }
        Subscription {
            cache: self.clone(),
            key,
        }
    }

    fn unsubscribe(&self, key: &QueryKey) {
        let now = self.clock.now();
        if let Some(entry) = self.lock().get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = Some(now);
        }
    }

    /// Return fresh cached data, join a fetch of the same key already in
    /// flight, or run `fetcher` and cache its result.
    ///
    /// The result is returned to the caller even when it was superseded by an
    /// invalidation; it is just not stored.
    #[instrument(skip_all, level = "debug", fields(key = %key))]
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ClientResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        self.collect_garbage();
        if let Some(value) = self.fresh::<T>(&key) {
            trace!("cache hit");
            return Ok(value);
        }

        let erased: Fetcher = Arc::new(move || -> FetchFuture {
            let fut = fetcher();
            Box::pin(async move { fut.await.map(|value| Arc::new(value) as CachedValue) })
        });

        let value = self.run_fetch(key, erased).await?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ClientError::Decode("cached value has an unexpected type".to_string()))
    }

    fn fresh<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        if !entry.is_fresh(now, self.stale_after) {
            return None;
        }
        entry.last_used = Some(now);
        entry.data.as_ref()?.downcast_ref::<T>().cloned()
    }

    async fn run_fetch(&self, key: QueryKey, fetcher: Fetcher) -> ClientResult<CachedValue> {
        loop {
            match self.begin_fetch(&key, fetcher.clone()) {
                FetchRole::Lead(generation, outcome) => {
                    let result = fetcher().await;
                    self.complete_fetch(&key, generation, &result);
                    outcome.send_replace(Some(result.clone()));
                    return result;
                }
                FetchRole::Follow(mut outcome) => {
                    trace!("joining fetch in flight for {}", key);
                    let shared = outcome
                        .wait_for(Option::is_some)
                        .await
                        .map(|value| (*value).clone());
                    if let Ok(Some(result)) = shared {
                        return result;
                    }
                    debug!("Fetch of {} was dropped before it finished, retrying", key);
                }
            }
        }
    }

    /// Join the running fetch of the current generation, or start a new one.
    fn begin_fetch(&self, key: &QueryKey, fetcher: Fetcher) -> FetchRole {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.last_used = Some(now);

        if let Some(running) = &entry.in_flight {
            if running.generation == entry.generation && running.is_live() {
                return FetchRole::Follow(running.outcome.clone());
            }
        }

        entry.generation += 1;
        entry.fetcher = Some(fetcher);
        let (sender, receiver) = watch::channel(None);
        entry.in_flight = Some(InFlight {
            generation: entry.generation,
            outcome: receiver,
        });
        FetchRole::Lead(entry.generation, sender)
    }

    /// Applies a fetch result unless the entry moved on while it was in flight.
    fn complete_fetch(
        &self,
        key: &QueryKey,
        generation: u64,
        result: &ClientResult<CachedValue>,
    ) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        if entry
            .in_flight
            .as_ref()
            .is_some_and(|running| running.generation == generation)
        {
            entry.in_flight = None;
        }
        entry.last_used = Some(now);
        if entry.generation != generation {
            debug!(
                "Dropping superseded response for {} (generation {} < {})",
                key, generation, entry.generation
            );
            return false;
        }
        match result {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.error = None;
                entry.invalidated = false;
            }
            Err(e) => {
                debug!("Fetch of {} failed: {}", key, e);
                entry.data = None;
                entry.error = Some(e.clone());
            }
        }
        entry.updated_at = Some(now);
        true
    }

    /// Mark every matching entry stale. Subscribed entries are refetched in
    /// the background; the call itself never waits for a refetch.
    #[instrument(skip_all, level = "debug")]
    pub fn invalidate<P>(&self, predicate: P) -> InvalidationReport
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut report = InvalidationReport::default();
        let mut refetches = Vec::new();
        {
            let mut entries = self.lock();
            for (key, entry) in entries.iter_mut().filter(|(key, _)| predicate(key)) {
                entry.invalidated = true;
                entry.generation += 1;
                match &entry.fetcher {
                    Some(fetcher) if entry.subscribers > 0 => {
                        refetches.push((key.clone(), fetcher.clone()))
                    }
                    _ => report.deferred.push(key.clone()),
                }
            }
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                for (key, fetcher) in refetches {
                    report.scheduled.push(key.clone());
                    let cache = self.clone();
                    handle.spawn(async move {
                        if let Err(e) = cache.run_fetch(key.clone(), fetcher).await {
                            debug!("Background refetch of {} failed: {}", key, e);
                        }
                    });
                }
            }
            Err(_) => {
                debug!("No async runtime, deferring {} refetches", refetches.len());
                report
                    .deferred
                    .extend(refetches.into_iter().map(|(key, _)| key));
            }
        }

        report.scheduled.sort();
        report.deferred.sort();
        debug!(
            "Invalidated {} keys ({} scheduled)",
            report.len(),
            report.scheduled.len()
        );
        report
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Keeps a key subscribed while alive.
#[derive(Debug)]
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    cache: QueryCache,
    key: QueryKey,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key);
    }
}
