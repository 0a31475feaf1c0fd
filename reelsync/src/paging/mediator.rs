// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Remote mediator
//!
//! Decides, per partition, whether a load boundary needs the network and commits what the
//! network returns through the local paged store's atomic writes. At most one operation
//! runs per partition; a load that arrives while one is running is dropped, while pinning
//! and invalidation wait for the running operation to finish.

use crate::cache::CacheConfig;
use crate::clock::Clock;
use crate::error::PagingResult;
use crate::model::{PageResult, PartitionCursor, PartitionKey};
use crate::remote::RemotePagedClient;
use crate::storage::{LocalPagedStore, PageWrite};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;

/// Load boundary raised by the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadType {
    /// Initial subscribe or explicit refresh
    Refresh,
    /// Before the first loaded row; never supported
    Prepend,
    /// Consumer is close to the end of loaded rows
    Append,
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadType::Refresh => write!(f, "REFRESH"),
            LoadType::Prepend => write!(f, "PREPEND"),
            LoadType::Append => write!(f, "APPEND"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediatorOutcome {
    Success { end_of_pagination_reached: bool },
    /// Another operation on the same partition was already in flight, or changed the
    /// partition while this one was fetching; nothing was written
    Coalesced,
}

impl MediatorOutcome {
    pub fn end_reached(&self) -> bool {
        matches!(
            self,
            MediatorOutcome::Success {
                end_of_pagination_reached: true
            }
        )
    }
}

/// Partitions with an operation in flight
#[derive(Default)]
struct InFlight {
    partitions: Mutex<HashSet<PartitionKey>>,
    released: Notify,
}

/// Released on drop so a failing or cancelled operation never leaves its partition locked
struct FlightGuard {
    in_flight: Arc<InFlight>,
    partition: PartitionKey,
}

impl InFlight {
    fn try_acquire(self: &Arc<Self>, partition: &PartitionKey) -> Option<FlightGuard> {
        if !self.partitions.lock().insert(partition.clone()) {
            return None;
        }
        Some(FlightGuard {
            in_flight: Arc::clone(self),
            partition: partition.clone(),
        })
    }

    /// Wait until the partition is free, then take it
    async fn acquire(self: &Arc<Self>, partition: &PartitionKey) -> FlightGuard {
        loop {
            // Registered before the check so a release in between is not missed
            let released = self.released.notified();
            if let Some(guard) = self.try_acquire(partition) {
                return guard;
            }
            released.await;
        }
    }

    async fn wait_released(&self, partition: &PartitionKey) {
        loop {
            let released = self.released.notified();
            if !self.contains(partition) {
                return;
            }
            released.await;
        }
    }

    fn contains(&self, partition: &PartitionKey) -> bool {
        self.partitions.lock().contains(partition)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.in_flight.partitions.lock().remove(&self.partition);
        self.in_flight.released.notify_waiters();
    }
}

/// Cursor after committing `result` as page `page`; an empty page ends the listing
fn cursor_after(partition: &PartitionKey, page: u32, result: &PageResult, now: i64) -> PartitionCursor {
    let mut cursor = PartitionCursor::after_fetch(partition.clone(), page, result.total_pages, now);
    if result.items.is_empty() {
        cursor.next_page = None;
    }
    cursor
}

#[derive(Clone)]
pub struct PagingMediator {
    store: Arc<dyn LocalPagedStore>,
    remote: Arc<dyn RemotePagedClient>,
    clock: Arc<dyn Clock>,
    cache: CacheConfig,
    in_flight: Arc<InFlight>,
}

impl PagingMediator {
    pub fn new(
        store: Arc<dyn LocalPagedStore>,
        remote: Arc<dyn RemotePagedClient>,
        clock: Arc<dyn Clock>,
        cache: CacheConfig,
    ) -> Self {
        Self {
            store,
            remote,
            clock,
            cache,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn cache_config(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn is_in_flight(&self, partition: &PartitionKey) -> bool {
        self.in_flight.contains(partition)
    }

    /// Resolves once no operation is running on the partition
    pub async fn wait_idle(&self, partition: &PartitionKey) {
        self.in_flight.wait_released(partition).await
    }

    /// Handle a load boundary raised automatically by the pager
    pub async fn load(
        &self,
        partition: &PartitionKey,
        load_type: LoadType,
    ) -> PagingResult<MediatorOutcome> {
        self.run(partition, load_type, false).await
    }

    /// User-requested refresh; always goes to the network
    pub async fn force_refresh(&self, partition: &PartitionKey) -> PagingResult<MediatorOutcome> {
        self.run(partition, LoadType::Refresh, true).await
    }

    async fn run(
        &self,
        partition: &PartitionKey,
        load_type: LoadType,
        forced: bool,
    ) -> PagingResult<MediatorOutcome> {
        if load_type == LoadType::Prepend {
            return Ok(MediatorOutcome::Success {
                end_of_pagination_reached: true,
            });
        }

        let _guard = match self.in_flight.try_acquire(partition) {
            Some(guard) => guard,
            None => {
                debug!("{} for {} coalesced into the running operation", load_type, partition);
                return Ok(MediatorOutcome::Coalesced);
            }
        };

        match load_type {
            LoadType::Refresh => self.refresh(partition, forced).await,
            LoadType::Append => self.append(partition).await,
            LoadType::Prepend => Ok(MediatorOutcome::Success {
                end_of_pagination_reached: true,
            }),
        }
    }

    /// Whether the partition's cached rows can be served without the network
    pub async fn is_fresh(&self, partition: &PartitionKey) -> PagingResult<bool> {
        let now = self.clock.now_millis();
        Ok(self
            .store
            .first_item(partition)
            .await?
            .map(|sample| self.cache.is_fresh(&sample.cache_metadata, now))
            .unwrap_or(false))
    }

    async fn refresh(&self, partition: &PartitionKey, forced: bool) -> PagingResult<MediatorOutcome> {
        if !forced && self.is_fresh(partition).await? {
            debug!("REFRESH for {} served from cache", partition);
            return Ok(MediatorOutcome::Success {
                end_of_pagination_reached: false,
            });
        }

        let result = match self.remote.fetch_page(partition, 1).await {
            Ok(result) => result,
            Err(e) => {
                if matches!(self.store.has_data(partition).await, Ok(true)) {
                    warn!("REFRESH for {} failed, keeping cached rows: {}", partition, e);
                } else {
                    debug!("REFRESH for {} failed: {}", partition, e);
                }
                return Err(e);
            }
        };

        let now = self.clock.now_millis();
        let cursor = cursor_after(partition, 1, &result, now);
        let end_reached = cursor.is_end_reached();
        let rows = PageWrite {
            page: 1,
            movies: result.items,
            metadata: self.cache.stamp(now),
        };
        let count = self.store.replace_partition(partition, rows, cursor).await?;
        info!(
            "Refreshed {}: {} rows, {} of {} pages",
            partition, count, 1, result.total_pages
        );
        Ok(MediatorOutcome::Success {
            end_of_pagination_reached: end_reached,
        })
    }

    async fn append(&self, partition: &PartitionKey) -> PagingResult<MediatorOutcome> {
        let cursor = match self.store.get_cursor(partition).await? {
            Some(cursor) => cursor,
            None => {
                // Never fetched; the pending REFRESH creates the cursor
                debug!("APPEND for {} before any REFRESH", partition);
                return Ok(MediatorOutcome::Success {
                    end_of_pagination_reached: false,
                });
            }
        };
        let page = match cursor.next_page {
            Some(page) => page,
            None => {
                return Ok(MediatorOutcome::Success {
                    end_of_pagination_reached: true,
                })
            }
        };

        // The cursor is untouched on failure so a retry asks for the same page
        let result = self.remote.fetch_page(partition, page).await.map_err(|e| {
            debug!("APPEND page {} for {} failed: {}", page, partition, e);
            e
        })?;

        let now = self.clock.now_millis();
        let next = cursor_after(partition, page, &result, now);
        let end_reached = next.is_end_reached();
        let rows = PageWrite {
            page,
            movies: result.items,
            metadata: self.cache.stamp(now),
        };
        let count = match self.store.append_page(partition, &cursor, rows, next).await? {
            Some(count) => count,
            None => {
                debug!(
                    "Page {} for {} dropped: the partition changed during the fetch",
                    page, partition
                );
                return Ok(MediatorOutcome::Coalesced);
            }
        };
        debug!(
            "Appended page {} to {}: {} rows total, end reached: {}",
            page, partition, count, end_reached
        );
        Ok(MediatorOutcome::Success {
            end_of_pagination_reached: end_reached,
        })
    }

    /// Mark every cached row of the partition as never expiring
    pub async fn pin_partition(&self, partition: &PartitionKey) -> PagingResult<u64> {
        let _guard = self.in_flight.acquire(partition).await;
        let pinned = self.store.pin_partition(partition).await?;
        info!("Pinned {} rows of {}", pinned, partition);
        Ok(pinned)
    }

    /// Drop the partition's rows and cursor; the next REFRESH starts over
    pub async fn invalidate_partition(&self, partition: &PartitionKey) -> PagingResult<()> {
        let _guard = self.in_flight.acquire(partition).await;
        self.store.clear_partition(partition).await?;
        info!("Invalidated {}", partition);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::PagingError;
    use crate::model::{CachedItem, Category, Movie};
    use crate::storage::persistent::{create_storage_driver, StorageType};
    use crate::storage::{CursorStore, KvPagedStore, StoreStats, PAGED_TREE};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::watch;

    /// Serves scripted responses in order and records every requested page
    #[derive(Default)]
    struct ScriptedRemote {
        responses: Mutex<VecDeque<PagingResult<PageResult>>>,
        calls: Mutex<Vec<u32>>,
    }

    impl ScriptedRemote {
        fn push(&self, response: PagingResult<PageResult>) {
            self.responses.lock().push_back(response);
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl RemotePagedClient for ScriptedRemote {
        async fn fetch_page(&self, _partition: &PartitionKey, page: u32) -> PagingResult<PageResult> {
            self.calls.lock().push(page);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Err(PagingError::network("no scripted response")))
        }

        async fn search_page(&self, _: &str, _: &str, _: u32) -> PagingResult<PageResult> {
            Err(PagingError::network("not scripted"))
        }
    }

    fn page(page: u32, total_pages: u32, n: u64) -> PageResult {
        PageResult {
            items: (0..n)
                .map(|i| Movie {
                    id: u64::from(page) * 1_000 + i,
                    title: format!("p{} #{}", page, i),
                    overview: String::new(),
                    poster_path: None,
                    backdrop_path: None,
                    release_date: None,
                    vote_average: 0.0,
                    vote_count: 0,
                    original_language: None,
                })
                .collect(),
            page,
            total_pages,
            total_results: u64::from(total_pages) * n,
        }
    }

    fn setup() -> (PagingMediator, Arc<KvPagedStore>, Arc<ScriptedRemote>, Arc<ManualClock>) {
        let driver = create_storage_driver(StorageType::Memory, "").unwrap();
        let store = Arc::new(KvPagedStore::new(driver.open_tree(PAGED_TREE).unwrap()));
        let remote = Arc::new(ScriptedRemote::default());
        let clock = Arc::new(ManualClock::new(1_000));
        let mediator = PagingMediator::new(
            store.clone(),
            remote.clone(),
            clock.clone(),
            CacheConfig::default(),
        );
        (mediator, store, remote, clock)
    }

    #[tokio::test]
    async fn test_prepend_is_always_end() {
        let (mediator, _, remote, _) = setup();
        let key = PartitionKey::new(Category::Popular, "en");
        let outcome = mediator.load(&key, LoadType::Prepend).await.unwrap();
        assert!(outcome.end_reached());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_append_without_cursor_skips_network() {
        let (mediator, _, remote, _) = setup();
        let key = PartitionKey::new(Category::Popular, "en");
        let outcome = mediator.load(&key, LoadType::Append).await.unwrap();
        assert_eq!(
            outcome,
            MediatorOutcome::Success {
                end_of_pagination_reached: false
            }
        );
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network_until_forced() {
        let (mediator, store, remote, clock) = setup();
        let key = PartitionKey::new(Category::Popular, "en");
        remote.push(Ok(page(1, 3, 4)));
        mediator.load(&key, LoadType::Refresh).await.unwrap();

        clock.advance(1_000);
        mediator.load(&key, LoadType::Refresh).await.unwrap();
        assert_eq!(remote.calls(), vec![1]);

        remote.push(Ok(page(1, 3, 2)));
        mediator.force_refresh(&key).await.unwrap();
        assert_eq!(remote.calls(), vec![1, 1]);
        assert_eq!(store.item_count(&key).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_version_mismatch_counts_as_expired() {
        let (mediator, store, remote, clock) = setup();
        let key = PartitionKey::new(Category::Popular, "en");
        remote.push(Ok(page(1, 1, 3)));
        mediator.load(&key, LoadType::Refresh).await.unwrap();

        let bumped = PagingMediator::new(
            store.clone(),
            remote.clone(),
            clock.clone(),
            CacheConfig {
                cache_version: 2,
                ..CacheConfig::default()
            },
        );
        assert!(!bumped.is_fresh(&key).await.unwrap());
        remote.push(Ok(page(1, 1, 3)));
        bumped.load(&key, LoadType::Refresh).await.unwrap();
        assert_eq!(remote.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_page_ends_pagination() {
        let (mediator, store, remote, _) = setup();
        let key = PartitionKey::new(Category::Upcoming, "en");
        remote.push(Ok(page(1, 9, 3)));
        mediator.load(&key, LoadType::Refresh).await.unwrap();
        remote.push(Ok(page(2, 9, 0)));
        let outcome = mediator.load(&key, LoadType::Append).await.unwrap();
        assert!(outcome.end_reached());
        let cursor = store.get_cursor(&key).await.unwrap().unwrap();
        assert_eq!(cursor.last_fetched_page, Some(2));
        assert_eq!(cursor.next_page, None);
    }

    /// Store whose emptiness check always fails
    struct BrokenHasData(KvPagedStore);

    #[async_trait]
    impl CursorStore for BrokenHasData {
        async fn get_cursor(&self, partition: &PartitionKey) -> PagingResult<Option<PartitionCursor>> {
            self.0.get_cursor(partition).await
        }

        async fn upsert_cursor(&self, cursor: PartitionCursor) -> PagingResult<()> {
            self.0.upsert_cursor(cursor).await
        }

        async fn delete_cursor(&self, partition: &PartitionKey) -> PagingResult<()> {
            self.0.delete_cursor(partition).await
        }
    }

    #[async_trait]
    impl LocalPagedStore for BrokenHasData {
        async fn read_page(
            &self,
            partition: &PartitionKey,
            load_size: usize,
            after_position: Option<u64>,
        ) -> PagingResult<Vec<CachedItem>> {
            self.0.read_page(partition, load_size, after_position).await
        }

        fn subscribe(&self, partition: &PartitionKey) -> watch::Receiver<u64> {
            self.0.subscribe(partition)
        }

        async fn replace_partition(
            &self,
            partition: &PartitionKey,
            rows: PageWrite,
            cursor: PartitionCursor,
        ) -> PagingResult<u64> {
            self.0.replace_partition(partition, rows, cursor).await
        }

        async fn append_page(
            &self,
            partition: &PartitionKey,
            expected: &PartitionCursor,
            rows: PageWrite,
            cursor: PartitionCursor,
        ) -> PagingResult<Option<u64>> {
            self.0.append_page(partition, expected, rows, cursor).await
        }

        async fn has_data(&self, _: &PartitionKey) -> PagingResult<bool> {
            Err(PagingError::Storage("disk unplugged".to_string()))
        }

        async fn first_item(&self, partition: &PartitionKey) -> PagingResult<Option<CachedItem>> {
            self.0.first_item(partition).await
        }

        async fn item_count(&self, partition: &PartitionKey) -> PagingResult<u64> {
            self.0.item_count(partition).await
        }

        async fn pin_partition(&self, partition: &PartitionKey) -> PagingResult<u64> {
            self.0.pin_partition(partition).await
        }

        async fn clear_partition(&self, partition: &PartitionKey) -> PagingResult<()> {
            self.0.clear_partition(partition).await
        }

        async fn clear_all(&self) -> PagingResult<()> {
            self.0.clear_all().await
        }

        async fn stats(&self) -> PagingResult<StoreStats> {
            self.0.stats().await
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_reports_the_remote_error() {
        let driver = create_storage_driver(StorageType::Memory, "").unwrap();
        let store = Arc::new(BrokenHasData(KvPagedStore::new(
            driver.open_tree(PAGED_TREE).unwrap(),
        )));
        let remote = Arc::new(ScriptedRemote::default());
        let mediator = PagingMediator::new(
            store,
            remote.clone(),
            Arc::new(ManualClock::new(1_000)),
            CacheConfig::default(),
        );
        let key = PartitionKey::new(Category::Popular, "en");

        remote.push(Err(PagingError::Api { http_code: 502 }));
        let err = mediator.load(&key, LoadType::Refresh).await.unwrap_err();
        assert_eq!(err, PagingError::Api { http_code: 502 });
        assert!(!mediator.is_in_flight(&key));
    }

    #[tokio::test]
    async fn test_flight_guard_released_after_failure() {
        let (mediator, _, remote, _) = setup();
        let key = PartitionKey::new(Category::TopRated, "en");
        remote.push(Err(PagingError::Api { http_code: 500 }));
        assert!(mediator.load(&key, LoadType::Refresh).await.is_err());
        assert!(!mediator.is_in_flight(&key));

        remote.push(Ok(page(1, 1, 1)));
        let outcome = mediator.load(&key, LoadType::Refresh).await.unwrap();
        assert!(outcome.end_reached());
    }
}
