// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Category cache repository
//!
//! Fixed-size per-category lists for home rows. There is no cursor: a miss or an expired
//! list re-fetches page 1 and replaces the whole list.

use crate::cache::CacheConfig;
use crate::clock::Clock;
use crate::error::{PagingError, PagingResult};
use crate::model::{Movie, PartitionKey};
use crate::remote::RemotePagedClient;
use crate::storage::HomeStore;
use log::{debug, warn};
use std::sync::Arc;

/// A home row together with whatever went wrong producing it
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryListing {
    pub items: Vec<Movie>,
    /// Set when the network failed; `items` then holds the stale cached list, if any
    pub error: Option<PagingError>,
    pub from_cache: bool,
}

pub struct CategoryCacheRepository {
    store: Arc<HomeStore>,
    remote: Arc<dyn RemotePagedClient>,
    clock: Arc<dyn Clock>,
    cache: CacheConfig,
    list_size: usize,
}

impl CategoryCacheRepository {
    pub fn new(
        store: Arc<HomeStore>,
        remote: Arc<dyn RemotePagedClient>,
        clock: Arc<dyn Clock>,
        cache: CacheConfig,
        list_size: usize,
    ) -> Self {
        Self {
            store,
            remote,
            clock,
            cache,
            list_size,
        }
    }

    /// The partition's list; `is_refresh` skips the freshness check
    pub async fn listing(
        &self,
        partition: &PartitionKey,
        is_refresh: bool,
    ) -> PagingResult<CategoryListing> {
        let cached = self.store.read_list(partition).await?;
        let now = self.clock.now_millis();
        let fresh = cached
            .first()
            .map(|row| self.cache.is_fresh(&row.cache_metadata, now))
            .unwrap_or(false);

        if fresh && !is_refresh {
            debug!("Home row {} served from cache", partition);
            return Ok(CategoryListing {
                items: cached.into_iter().map(|row| row.movie).collect(),
                error: None,
                from_cache: true,
            });
        }

        match self.remote.fetch_page(partition, 1).await {
            Ok(result) => {
                let mut items = result.items;
                items.truncate(self.list_size);
                let now = self.clock.now_millis();
                self.store
                    .replace_list(partition, items.clone(), self.cache.stamp(now))
                    .await?;
                debug!("Home row {} replaced with {} items", partition, items.len());
                Ok(CategoryListing {
                    items,
                    error: None,
                    from_cache: false,
                })
            }
            Err(e) => {
                warn!(
                    "Home row {} fetch failed, serving {} cached items: {}",
                    partition,
                    cached.len(),
                    e
                );
                Ok(CategoryListing {
                    items: cached.into_iter().map(|row| row.movie).collect(),
                    error: Some(e),
                    from_cache: true,
                })
            }
        }
    }

    pub async fn clear(&self) -> PagingResult<()> {
        self.store.clear_all().await
    }
}
