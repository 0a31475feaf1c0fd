// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ordered key-value abstraction under the cache
//!
//! Every scan yields keys in ascending byte order. The paged store encodes row
//! positions big-endian into its keys and relies on that order for reads.

use super::types::{KvPair, StorageResult, StorageType, WriteBatch};
use std::path::Path;

/// One named, key-ordered keyspace of a driver
pub trait StorageTree: Send + Sync {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn remove(&self, key: &[u8]) -> StorageResult<()>;

    /// Drop every key of this tree
    fn clear(&self) -> StorageResult<()>;

    /// Keys starting with `prefix`, ascending
    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<KvPair>> + '_>>;

    /// Up to `limit` pairs whose key starts with `prefix` and is `>= start`, ascending
    fn scan_from(&self, prefix: &[u8], start: &[u8], limit: usize) -> StorageResult<Vec<KvPair>>;

    /// Pair with the greatest key under `prefix`
    fn last_with_prefix(&self, prefix: &[u8]) -> StorageResult<Option<KvPair>>;

    /// All operations of `batch` become visible together, or none do
    fn apply_batch(&self, batch: WriteBatch) -> StorageResult<()>;
}

/// A backend that hands out trees
pub trait StorageDriver: Send + Sync {
    type Tree: StorageTree;

    fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self>
    where
        Self: Sized;

    /// Open `name`, creating it when absent. Handles to the same name share data.
    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree>;

    fn flush(&self) -> StorageResult<()>;

    fn storage_type(&self) -> StorageType;

    /// Make every committed batch durable before the driver is dropped
    fn shutdown(&mut self) -> StorageResult<()> {
        self.flush()
    }
}

impl StorageTree for Box<dyn StorageTree> {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).insert(key, value)
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<KvPair>> + '_>> {
        (**self).scan_prefix(prefix)
    }

    fn scan_from(&self, prefix: &[u8], start: &[u8], limit: usize) -> StorageResult<Vec<KvPair>> {
        (**self).scan_from(prefix, start, limit)
    }

    fn last_with_prefix(&self, prefix: &[u8]) -> StorageResult<Option<KvPair>> {
        (**self).last_with_prefix(prefix)
    }

    fn apply_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        (**self).apply_batch(batch)
    }
}
