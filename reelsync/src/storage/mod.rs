// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Local persistence for the catalog cache
//!
//! This module provides:
//! - Ordered key-value drivers (Sled on disk, memory for tests)
//! - The key layout that keeps partitions disjoint and rows position-ordered
//! - The local paged store with its cursor store and change notifications
//! - The bounded home-row store

pub mod home_store;
pub mod keys;
pub mod paged_store;
pub mod persistent;

pub use home_store::{HomeRow, HomeStore, HOME_TREE};
pub use paged_store::{
    CursorStore, KvPagedStore, LocalPagedStore, PageWrite, PartitionStats, StoreStats, PAGED_TREE,
};
pub use persistent::{
    create_storage_driver, DynStorageDriver, StorageDriver, StorageDriverError, StorageTree,
    StorageType,
};
