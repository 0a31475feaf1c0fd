// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Fixed-size per-category lists
//!
//! Holds the bounded "home row" listings. A list is only ever replaced wholesale.

use crate::cache::CacheMetadata;
use crate::error::PagingResult;
use crate::model::{Movie, PartitionKey};
use crate::storage::keys;
use crate::storage::persistent::{StorageTree, WriteBatch};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Name of the tree holding home rows
pub const HOME_TREE: &str = "home_rows";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeRow {
    pub movie: Movie,
    pub index: u32,
    pub cache_metadata: CacheMetadata,
}

pub struct HomeStore {
    tree: Box<dyn StorageTree>,
    write_lock: Mutex<()>,
}

impl HomeStore {
    pub fn new(tree: Box<dyn StorageTree>) -> Self {
        Self {
            tree,
            write_lock: Mutex::new(()),
        }
    }

    /// Rows of the list in index order
    pub async fn read_list(&self, partition: &PartitionKey) -> PagingResult<Vec<HomeRow>> {
        self.tree
            .scan_prefix(&keys::home_prefix(partition))?
            .map(|entry| -> PagingResult<HomeRow> {
                let (_, value) = entry?;
                Ok(bincode::deserialize(&value)?)
            })
            .collect()
    }

    /// Atomically swap the whole list for `movies`
    pub async fn replace_list(
        &self,
        partition: &PartitionKey,
        movies: Vec<Movie>,
        metadata: CacheMetadata,
    ) -> PagingResult<usize> {
        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::new();
        for entry in self.tree.scan_prefix(&keys::home_prefix(partition))? {
            batch.remove(entry?.0);
        }
        let count = movies.len();
        for (index, movie) in (0u32..).zip(movies) {
            let row = HomeRow {
                movie,
                index,
                cache_metadata: metadata,
            };
            batch.insert(keys::home_key(partition, index), bincode::serialize(&row)?);
        }
        self.tree.apply_batch(batch)?;
        Ok(count)
    }

    pub async fn clear_all(&self) -> PagingResult<()> {
        let _guard = self.write_lock.lock();
        self.tree.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::storage::persistent::{create_storage_driver, StorageType};

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 0.0,
            vote_count: 0,
            original_language: None,
        }
    }

    #[tokio::test]
    async fn test_replace_list_is_wholesale() {
        let driver = create_storage_driver(StorageType::Memory, "").unwrap();
        let store = HomeStore::new(driver.open_tree(HOME_TREE).unwrap());
        let key = PartitionKey::new(Category::Popular, "en");
        let meta = CacheMetadata::new(0, 100, 1);

        store
            .replace_list(&key, (0..5).map(movie).collect(), meta)
            .await
            .unwrap();
        store
            .replace_list(&key, (10..13).map(movie).collect(), meta)
            .await
            .unwrap();

        let rows = store.read_list(&key).await.unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(rows[2].index, 2);
    }
}
