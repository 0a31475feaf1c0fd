// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver selection for the configured storage type

use super::traits::{StorageDriver, StorageTree};
#[cfg(not(feature = "sled-backend"))]
use super::types::StorageDriverError;
use super::types::{StorageResult, StorageType};
use std::path::Path;

/// Driver as handed to the catalog; trees come back boxed so stores never name a backend
pub type DynStorageDriver = Box<dyn StorageDriver<Tree = Box<dyn StorageTree>>>;

/// Open the cache backend at `path`
///
/// `path` is ignored for [`StorageType::Memory`]. For sled, missing parent directories
/// are created first.
///
/// ```ignore
/// let driver = create_storage_driver(StorageType::Sled, "./reelsync-data")?;
/// let rows = driver.open_tree(PAGED_TREE)?;
/// ```
pub fn create_storage_driver<P: AsRef<Path>>(
    storage_type: StorageType,
    path: P,
) -> StorageResult<DynStorageDriver> {
    match storage_type {
        #[cfg(feature = "sled-backend")]
        StorageType::Sled => {
            use crate::storage::persistent::sled::SledDriver;
            if let Some(parent) = path.as_ref().parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Box::new(SledDriver::open(path)?) as DynStorageDriver)
        }
        #[cfg(not(feature = "sled-backend"))]
        StorageType::Sled => Err(StorageDriverError::Unavailable(
            "built without the sled-backend feature".to_string(),
        )),
        StorageType::Memory => {
            use crate::storage::persistent::memory::MemoryStorageDriver;
            Ok(Box::new(MemoryStorageDriver::open(path)?) as DynStorageDriver)
        }
    }
}
