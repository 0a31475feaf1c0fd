// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Movie catalog - the entry point for consumers
//!
//! Wires the storage driver, the local stores, the mediator, the search pager, and the
//! home repository together, and picks partitions from the current language.

use crate::clock::{Clock, SystemClock};
use crate::config::ReelsyncConfig;
use crate::error::{PagingError, PagingResult};
use crate::home::{CategoryCacheRepository, CategoryListing};
use crate::locale::LocaleCache;
use crate::model::{Category, PartitionKey};
use crate::paging::{PagingMediator, PagingStream, SearchPager, SearchStream};
use crate::remote::{HttpCatalogClient, RemotePagedClient};
use crate::storage::{
    create_storage_driver, DynStorageDriver, HomeStore, KvPagedStore, LocalPagedStore,
    StoreStats, HOME_TREE, PAGED_TREE,
};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct MovieCatalog {
    config: ReelsyncConfig,
    driver: Mutex<DynStorageDriver>,
    store: Arc<KvPagedStore>,
    mediator: PagingMediator,
    search: SearchPager,
    home: CategoryCacheRepository,
    locale: LocaleCache,
}

impl MovieCatalog {
    /// Catalog backed by the HTTP client described in `config.api`
    pub fn from_config(config: ReelsyncConfig) -> PagingResult<Self> {
        let remote = Arc::new(HttpCatalogClient::new(&config.api)?);
        Self::open(config, remote)
    }

    pub fn open(config: ReelsyncConfig, remote: Arc<dyn RemotePagedClient>) -> PagingResult<Self> {
        Self::open_with_clock(config, remote, Arc::new(SystemClock))
    }

    /// Like [`MovieCatalog::open`] with an explicit time source
    pub fn open_with_clock(
        config: ReelsyncConfig,
        remote: Arc<dyn RemotePagedClient>,
        clock: Arc<dyn Clock>,
    ) -> PagingResult<Self> {
        config.validate().map_err(PagingError::Validation)?;

        let driver = create_storage_driver(config.storage.storage_type, &config.storage.path)?;
        let store = Arc::new(KvPagedStore::new(driver.open_tree(PAGED_TREE)?));
        let home_store = Arc::new(HomeStore::new(driver.open_tree(HOME_TREE)?));

        let mediator = PagingMediator::new(
            store.clone(),
            remote.clone(),
            clock.clone(),
            config.cache.clone(),
        );
        let search = SearchPager::new(remote.clone(), config.search.clone());
        let home = CategoryCacheRepository::new(
            home_store,
            remote,
            clock,
            config.cache.clone(),
            config.home.list_size,
        );
        let locale = LocaleCache::new(config.default_language.clone());

        info!(
            "Opened {} catalog cache at {:?}",
            config.storage.storage_type, config.storage.path
        );
        Ok(Self {
            config,
            driver: Mutex::new(driver),
            store,
            mediator,
            search,
            home,
            locale,
        })
    }

    pub fn config(&self) -> &ReelsyncConfig {
        &self.config
    }

    pub fn language(&self) -> String {
        self.locale.language()
    }

    /// Streams opened afterwards use the new language; returns the previous one
    pub fn set_language(&self, language: impl Into<String>) -> String {
        let previous = self.locale.set_language(language);
        debug!("Language changed from {} to {}", previous, self.locale.language());
        previous
    }

    pub fn partition(&self, category: Category) -> PartitionKey {
        self.locale.partition(category)
    }

    /// Stream of `category` in the current language
    pub fn movies(&self, category: Category) -> PagingStream {
        self.movies_in(self.partition(category))
    }

    pub fn movies_in(&self, partition: PartitionKey) -> PagingStream {
        PagingStream::spawn(
            partition,
            self.store.clone(),
            self.mediator.clone(),
            self.config.paging.clone(),
        )
    }

    /// Search in the current language with the first page already requested.
    /// An out-of-bounds query fails here; a failed first page is reported in the
    /// stream's refresh state.
    pub async fn search(&self, query: &str) -> PagingResult<SearchStream> {
        let mut stream = self.search.stream(query, &self.language())?;
        if let Err(e) = stream.refresh().await {
            debug!("First search page for {:?} failed: {}", stream.query(), e);
        }
        Ok(stream)
    }

    /// Bounded home row of `category` in the current language
    pub async fn home(&self, category: Category, is_refresh: bool) -> PagingResult<CategoryListing> {
        self.home.listing(&self.partition(category), is_refresh).await
    }

    pub async fn cache_stats(&self) -> PagingResult<StoreStats> {
        self.store.stats().await
    }

    pub async fn invalidate(&self, partition: &PartitionKey) -> PagingResult<()> {
        self.mediator.invalidate_partition(partition).await
    }

    pub async fn pin(&self, partition: &PartitionKey) -> PagingResult<u64> {
        self.mediator.pin_partition(partition).await
    }

    /// Drop every cached row, cursor, and home row
    pub async fn clear_cache(&self) -> PagingResult<()> {
        self.store.clear_all().await?;
        self.home.clear().await?;
        info!("Cleared catalog cache");
        Ok(())
    }

    /// Flush the storage driver
    pub fn shutdown(&self) -> PagingResult<()> {
        self.driver.lock().shutdown()?;
        info!("Catalog cache shut down");
        Ok(())
    }
}
