// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory storage driver implementation for tests and ephemeral caches

use super::traits::{StorageDriver, StorageTree};
use super::types::{BatchOp, KvPair, StorageResult, StorageType, WriteBatch};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

type TreeData = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

/// In-memory storage driver
#[derive(Default)]
pub struct MemoryStorageDriver {
    trees: Arc<RwLock<HashMap<String, TreeData>>>,
}

/// In-memory tree implementation, ordered like an on-disk tree
pub struct MemoryTree {
    data: TreeData,
}

impl MemoryStorageDriver {
    /// Create a new memory storage driver
    pub fn new() -> Self {
        Self::default()
    }
}

/// Smallest key greater than every key starting with `prefix`; `None` when unbounded
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn collect_prefix(data: &BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> Vec<KvPair> {
    data.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl StorageTree for MemoryTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn remove(&self, key: &[u8]) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.data.write().clear();
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
    ) -> StorageResult<Box<dyn Iterator<Item = StorageResult<KvPair>> + '_>> {
        // Snapshot under the read lock so callers never hold it across their own work
        let items = collect_prefix(&self.data.read(), prefix);
        Ok(Box::new(items.into_iter().map(Ok)))
    }

    fn scan_from(&self, prefix: &[u8], start: &[u8], limit: usize) -> StorageResult<Vec<KvPair>> {
        let data = self.data.read();
        let items = data
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(items)
    }

    fn last_with_prefix(&self, prefix: &[u8]) -> StorageResult<Option<KvPair>> {
        let data = self.data.read();
        let end = prefix_end(prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };
        let last = data
            .range::<[u8], _>((Bound::Included(prefix), upper))
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(last)
    }

    fn apply_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut data = self.data.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Insert { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Remove { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

impl StorageDriver for MemoryStorageDriver {
    type Tree = Box<dyn StorageTree>;

    fn open<P: AsRef<Path>>(_path: P) -> StorageResult<Self> {
        Ok(Self::new())
    }

    fn open_tree(&self, name: &str) -> StorageResult<Self::Tree> {
        let mut trees = self.trees.write();
        let data = trees
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(BTreeMap::new())))
            .clone();
        Ok(Box::new(MemoryTree { data }) as Box<dyn StorageTree>)
    }

    fn flush(&self) -> StorageResult<()> {
        // No-op for memory storage
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Memory
    }
}
