// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reelsync - offline-first paginated movie catalog cache
//!
//! Reelsync keeps paginated catalog listings in a local, persistent store and fills it
//! from a remote API only when the cached rows are missing or expired.
//!
//! # Features
//!
//! - **Partitioned cache**: one position-ordered row set per category and language
//! - **Atomic pages**: rows and pagination cursor are written in one batch
//! - **Single-flight loads**: one remote fetch per partition at a time
//! - **Stale-but-available**: failed refreshes never hide cached rows
//! - **Embedded storage**: Sled on disk, or memory for ephemeral sessions
//!
//! # Usage
//!
//! ```ignore
//! use reelsync::{Category, MovieCatalog, ReelsyncConfig};
//!
//! let catalog = MovieCatalog::from_config(ReelsyncConfig::default())?;
//! let mut popular = catalog.movies(Category::Popular);
//! let snapshot = popular.settled().await;
//! popular.access(15);
//! ```

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod home;
pub mod locale;
pub mod model;
pub mod paging;
pub mod remote;
pub mod storage;

pub use cache::{CacheConfig, CacheMetadata};
pub use catalog::MovieCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ApiConfig, ConfigError, HomeConfig, PagingConfig, ReelsyncConfig, SearchConfig, StorageConfig,
};
pub use error::{PagingError, PagingResult};
pub use home::{CategoryCacheRepository, CategoryListing};
pub use locale::LocaleCache;
pub use model::{CachedItem, Category, Movie, PageResult, PartitionCursor, PartitionKey};
pub use paging::{
    LoadState, LoadType, MediatorOutcome, PagingMediator, PagingSnapshot, PagingStream,
    SearchPage, SearchPager, SearchStream,
};
pub use remote::{HttpCatalogClient, RemotePagedClient};
pub use storage::{LocalPagedStore, StorageType, StoreStats};

/// Reelsync version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reelsync crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
