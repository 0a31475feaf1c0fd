// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Persistent storage backends
//!
//! Trait-based abstractions for ordered key-value storage, allowing the cache to run
//! on disk (Sled) or entirely in memory.
//!
//! # Architecture
//!
//! ```text
//! PagedStore / HomeStore (rows, cursors, notifications)
//!     ↓
//! StorageDriver / StorageTree (ordered key-value abstraction, atomic batches)
//!     ↓
//! Concrete Implementations (Sled, Memory)
//! ```

pub mod factory;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod traits;
pub mod types;

pub use factory::{create_storage_driver, DynStorageDriver};
pub use traits::{StorageDriver, StorageTree};
pub use types::{StorageDriverError, StorageResult, StorageType, WriteBatch};
