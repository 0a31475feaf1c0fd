// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Local paged store
//!
//! Persistent, position-ordered table of cached rows plus the per-partition cursor.
//! The row set and cursor of a partition change only through [`LocalPagedStore::replace_partition`]
//! and [`LocalPagedStore::append_page`], each a single atomic batch, so a crash can never
//! leave a cursor pointing past rows that were not written. An append also checks the
//! cursor it was computed from, so a page fetched before an invalidation or a clear is
//! never written onto the emptied partition.
//!
//! Readers subscribe to a partition and receive a generation counter that is bumped after
//! every committed write; they re-read the pages they need when it changes.

use crate::cache::CacheMetadata;
use crate::error::{PagingError, PagingResult};
use crate::model::{CachedItem, Movie, PartitionCursor, PartitionKey};
use crate::storage::keys;
use crate::storage::persistent::{StorageTree, WriteBatch};
use async_trait::async_trait;
use log::{debug, error};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::watch;

/// Name of the tree holding rows and cursors
pub const PAGED_TREE: &str = "paged_items";

/// Rows of one fetched remote page, before positions are assigned
#[derive(Debug, Clone)]
pub struct PageWrite {
    pub page: u32,
    pub movies: Vec<Movie>,
    pub metadata: CacheMetadata,
}

/// Row count and cursor of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    pub partition: PartitionKey,
    pub rows: u64,
    pub cursor: PartitionCursor,
}

/// Snapshot of everything the store holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub partitions: Vec<PartitionStats>,
    pub total_rows: u64,
}

/// Pagination cursor persistence
///
/// These write the cursor on its own. The mediator never uses them: its cursor changes
/// travel in the same batch as the rows through [`LocalPagedStore`].
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn get_cursor(&self, partition: &PartitionKey) -> PagingResult<Option<PartitionCursor>>;

    async fn upsert_cursor(&self, cursor: PartitionCursor) -> PagingResult<()>;

    async fn delete_cursor(&self, partition: &PartitionKey) -> PagingResult<()>;
}

/// Persistent cached rows with a reactive, position-ordered reader
#[async_trait]
pub trait LocalPagedStore: CursorStore {
    /// Up to `load_size` rows with position greater than `after_position`
    /// (from position 0 when `None`), in position order
    async fn read_page(
        &self,
        partition: &PartitionKey,
        load_size: usize,
        after_position: Option<u64>,
    ) -> PagingResult<Vec<CachedItem>>;

    /// Generation counter bumped after every committed write to the partition
    fn subscribe(&self, partition: &PartitionKey) -> watch::Receiver<u64>;

    /// Atomically drop every row and the cursor of the partition, then write `rows`
    /// at positions `0..n` and `cursor`. Returns the partition's row count.
    async fn replace_partition(
        &self,
        partition: &PartitionKey,
        rows: PageWrite,
        cursor: PartitionCursor,
    ) -> PagingResult<u64>;

    /// Atomically write `rows` after the partition's last position and store `cursor`,
    /// provided the stored cursor still equals `expected`. Returns the partition's row
    /// count, or `None` without writing when the cursor has moved.
    async fn append_page(
        &self,
        partition: &PartitionKey,
        expected: &PartitionCursor,
        rows: PageWrite,
        cursor: PartitionCursor,
    ) -> PagingResult<Option<u64>>;

    async fn has_data(&self, partition: &PartitionKey) -> PagingResult<bool>;

    /// Row at position 0, used as the partition's freshness sample
    async fn first_item(&self, partition: &PartitionKey) -> PagingResult<Option<CachedItem>>;

    async fn item_count(&self, partition: &PartitionKey) -> PagingResult<u64>;

    /// Rewrite every row of the partition as persistent. Returns the number of rows pinned.
    async fn pin_partition(&self, partition: &PartitionKey) -> PagingResult<u64>;

    /// Drop every row and the cursor of the partition
    async fn clear_partition(&self, partition: &PartitionKey) -> PagingResult<()>;

    async fn clear_all(&self) -> PagingResult<()>;

    async fn stats(&self) -> PagingResult<StoreStats>;
}

/// [`LocalPagedStore`] over an ordered key-value tree
pub struct KvPagedStore {
    tree: Box<dyn StorageTree>,
    /// Serialises read-modify-write batches; position assignment reads the tail first
    write_lock: Mutex<()>,
    notifiers: Mutex<HashMap<PartitionKey, watch::Sender<u64>>>,
}

impl KvPagedStore {
    pub fn new(tree: Box<dyn StorageTree>) -> Self {
        Self {
            tree,
            write_lock: Mutex::new(()),
            notifiers: Mutex::new(HashMap::new()),
        }
    }

    fn notify(&self, partition: &PartitionKey) {
        if let Some(sender) = self.notifiers.lock().get(partition) {
            sender.send_modify(|generation| *generation += 1);
        }
    }

    fn notify_all(&self) {
        for sender in self.notifiers.lock().values() {
            sender.send_modify(|generation| *generation += 1);
        }
    }

    fn decode_item(bytes: &[u8]) -> PagingResult<CachedItem> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn decode_cursor(bytes: &[u8]) -> PagingResult<PartitionCursor> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn last_position(&self, partition: &PartitionKey) -> PagingResult<Option<u64>> {
        let prefix = keys::item_prefix(partition);
        let last = self.tree.last_with_prefix(&prefix)?;
        Ok(last.and_then(|(key, _)| keys::position_of(&key)))
    }

    fn partition_keys(&self, partition: &PartitionKey) -> PagingResult<Vec<Vec<u8>>> {
        let prefix = keys::item_prefix(partition);
        self.tree
            .scan_prefix(&prefix)?
            .map(|entry| entry.map(|(key, _)| key).map_err(PagingError::from))
            .collect()
    }

    fn push_rows(
        batch: &mut WriteBatch,
        partition: &PartitionKey,
        rows: PageWrite,
        first_position: u64,
    ) -> PagingResult<u64> {
        let mut position = first_position;
        for movie in rows.movies {
            let item = CachedItem {
                movie,
                partition: partition.clone(),
                page: rows.page,
                position,
                cache_metadata: rows.metadata,
            };
            batch.insert(keys::item_key(partition, position), bincode::serialize(&item)?);
            position += 1;
        }
        Ok(position)
    }

    fn check_cursor(partition: &PartitionKey, cursor: &PartitionCursor) -> PagingResult<()> {
        if &cursor.partition != partition {
            return Err(PagingError::Storage(format!(
                "cursor for {} written to partition {}",
                cursor.partition, partition
            )));
        }
        Ok(())
    }

    fn commit(&self, partition: &PartitionKey, batch: WriteBatch) -> PagingResult<()> {
        let ops = batch.len();
        self.tree.apply_batch(batch).map_err(|e| {
            error!("Failed to commit {} writes for {}: {}", ops, partition, e);
            PagingError::from(e)
        })?;
        debug!("Committed {} writes for {}", ops, partition);
        Ok(())
    }
}

#[async_trait]
impl CursorStore for KvPagedStore {
    async fn get_cursor(&self, partition: &PartitionKey) -> PagingResult<Option<PartitionCursor>> {
        match self.tree.get(&keys::cursor_key(partition))? {
            Some(bytes) => Ok(Some(Self::decode_cursor(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert_cursor(&self, cursor: PartitionCursor) -> PagingResult<()> {
        let _guard = self.write_lock.lock();
        let bytes = bincode::serialize(&cursor)?;
        self.tree.insert(&keys::cursor_key(&cursor.partition), &bytes)?;
        Ok(())
    }

    async fn delete_cursor(&self, partition: &PartitionKey) -> PagingResult<()> {
        let _guard = self.write_lock.lock();
        self.tree.remove(&keys::cursor_key(partition))?;
        Ok(())
    }
}

#[async_trait]
impl LocalPagedStore for KvPagedStore {
    async fn read_page(
        &self,
        partition: &PartitionKey,
        load_size: usize,
        after_position: Option<u64>,
    ) -> PagingResult<Vec<CachedItem>> {
        let start_position = match after_position {
            Some(position) => match position.checked_add(1) {
                Some(next) => next,
                None => return Ok(Vec::new()),
            },
            None => 0,
        };
        let prefix = keys::item_prefix(partition);
        let start = keys::item_key(partition, start_position);
        self.tree
            .scan_from(&prefix, &start, load_size)?
            .iter()
            .map(|(_, value)| Self::decode_item(value))
            .collect()
    }

    fn subscribe(&self, partition: &PartitionKey) -> watch::Receiver<u64> {
        self.notifiers
            .lock()
            .entry(partition.clone())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    async fn replace_partition(
        &self,
        partition: &PartitionKey,
        rows: PageWrite,
        cursor: PartitionCursor,
    ) -> PagingResult<u64> {
        Self::check_cursor(partition, &cursor)?;
        let count = {
            let _guard = self.write_lock.lock();
            let mut batch = WriteBatch::new();
            for key in self.partition_keys(partition)? {
                batch.remove(key);
            }
            // Remove-then-insert of the cursor replaces it instead of merging into a stale one
            batch.remove(keys::cursor_key(partition));
            let count = Self::push_rows(&mut batch, partition, rows, 0)?;
            batch.insert(keys::cursor_key(partition), bincode::serialize(&cursor)?);
            self.commit(partition, batch)?;
            count
        };
        self.notify(partition);
        Ok(count)
    }

    async fn append_page(
        &self,
        partition: &PartitionKey,
        expected: &PartitionCursor,
        rows: PageWrite,
        cursor: PartitionCursor,
    ) -> PagingResult<Option<u64>> {
        Self::check_cursor(partition, &cursor)?;
        let count = {
            let _guard = self.write_lock.lock();
            let stored = match self.tree.get(&keys::cursor_key(partition))? {
                Some(bytes) => Some(Self::decode_cursor(&bytes)?),
                None => None,
            };
            if stored.as_ref() != Some(expected) {
                debug!("Append to {} rejected: cursor moved", partition);
                return Ok(None);
            }
            let first_position = match self.last_position(partition)? {
                Some(last) => last + 1,
                None => 0,
            };
            let mut batch = WriteBatch::new();
            let count = Self::push_rows(&mut batch, partition, rows, first_position)?;
            batch.insert(keys::cursor_key(partition), bincode::serialize(&cursor)?);
            self.commit(partition, batch)?;
            count
        };
        self.notify(partition);
        Ok(Some(count))
    }

    async fn has_data(&self, partition: &PartitionKey) -> PagingResult<bool> {
        Ok(self
            .tree
            .scan_from(&keys::item_prefix(partition), &keys::item_key(partition, 0), 1)?
            .first()
            .is_some())
    }

    async fn first_item(&self, partition: &PartitionKey) -> PagingResult<Option<CachedItem>> {
        Ok(self.read_page(partition, 1, None).await?.into_iter().next())
    }

    async fn item_count(&self, partition: &PartitionKey) -> PagingResult<u64> {
        Ok(self.tree.scan_prefix(&keys::item_prefix(partition))?.count() as u64)
    }

    async fn pin_partition(&self, partition: &PartitionKey) -> PagingResult<u64> {
        let pinned = {
            let _guard = self.write_lock.lock();
            let mut batch = WriteBatch::new();
            for entry in self.tree.scan_prefix(&keys::item_prefix(partition))? {
                let (key, value) = entry?;
                let mut item = Self::decode_item(&value)?;
                item.cache_metadata = item.cache_metadata.pinned();
                batch.insert(key, bincode::serialize(&item)?);
            }
            let pinned = batch.len() as u64;
            if pinned > 0 {
                self.commit(partition, batch)?;
            }
            pinned
        };
        if pinned > 0 {
            self.notify(partition);
        }
        Ok(pinned)
    }

    async fn clear_partition(&self, partition: &PartitionKey) -> PagingResult<()> {
        {
            let _guard = self.write_lock.lock();
            let mut batch = WriteBatch::new();
            for key in self.partition_keys(partition)? {
                batch.remove(key);
            }
            batch.remove(keys::cursor_key(partition));
            self.commit(partition, batch)?;
        }
        self.notify(partition);
        Ok(())
    }

    async fn clear_all(&self) -> PagingResult<()> {
        {
            let _guard = self.write_lock.lock();
            self.tree.clear()?;
        }
        self.notify_all();
        Ok(())
    }

    async fn stats(&self) -> PagingResult<StoreStats> {
        let cursors = self
            .tree
            .scan_prefix(keys::cursor_namespace())?
            .map(|entry| Self::decode_cursor(&entry?.1))
            .collect::<PagingResult<Vec<_>>>()?;

        let mut stats = StoreStats::default();
        for cursor in cursors {
            let rows = self.item_count(&cursor.partition).await?;
            stats.total_rows += rows;
            stats.partitions.push(PartitionStats {
                partition: cursor.partition.clone(),
                rows,
                cursor,
            });
        }
        Ok(stats)
    }
}
