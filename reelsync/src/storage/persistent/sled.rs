// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled storage driver implementation

use super::traits::{StorageDriver, StorageTree};
use super::types::{BatchOp, KvPair, StorageDriverError, StorageResult, StorageType, WriteBatch};
use std::path::Path;

fn backend(e: sled::Error) -> StorageDriverError {
    StorageDriverError::BackendSpecific(e.to_string())
}

/// Sled driver implementation
pub struct SledDriver {
    db: sled::Db,
}

/// Sled tree wrapper that implements StorageTree trait
pub struct SledTree {
    tree: sled::Tree,
}

impl StorageTree for SledTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.tree
            .get(key)
            .map_err(backend)
            .map(|opt| opt.map(|v| v.to_vec()))
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.tree.remove(key).map_err(backend)?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.tree.clear().map_err(backend)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<KvPair>> + '_>> {
        let iter = self.tree.scan_prefix(prefix).map(|result| {
            result
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(backend)
        });
        Ok(Box::new(iter))
    }

    fn scan_from(&self, prefix: &[u8], start: &[u8], limit: usize) -> StorageResult<Vec<KvPair>> {
        let mut results = Vec::with_capacity(limit.min(256));
        for entry in self.tree.range(start.to_vec()..) {
            if results.len() >= limit {
                break;
            }
            let (k, v) = entry.map_err(backend)?;
            if !k.starts_with(prefix) {
                break;
            }
            results.push((k.to_vec(), v.to_vec()));
        }
        Ok(results)
    }

    fn last_with_prefix(&self, prefix: &[u8]) -> StorageResult<Option<KvPair>> {
        match self.tree.scan_prefix(prefix).next_back() {
            Some(entry) => {
                let (k, v) = entry.map_err(backend)?;
                Ok(Some((k.to_vec(), v.to_vec())))
            }
            None => Ok(None),
        }
    }

    fn apply_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Insert { key, value } => sled_batch.insert(key, value),
                BatchOp::Remove { key } => sled_batch.remove(key),
            }
        }
        self.tree.apply_batch(sled_batch).map_err(backend)
    }
}

impl StorageDriver for SledDriver {
    type Tree = Box<dyn StorageTree>;

    fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path).map_err(backend)?;
        Ok(SledDriver { db })
    }

    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree> {
        let tree = self.db.open_tree(name).map_err(backend)?;
        Ok(Box::new(SledTree { tree }) as Box<dyn StorageTree>)
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush().map_err(backend)?;
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Sled
    }
}
