// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend selection, atomic write batches and driver errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend behind the cache
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Embedded on-disk database; survives restarts
    #[default]
    Sled,

    /// Lost when the process exits
    Memory,
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageType::Sled),
            "memory" => Ok(StorageType::Memory),
            _ => Err(format!(
                "Unknown storage type: {}. Valid options: sled, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Sled => "sled",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// A single operation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}

/// Ordered set of writes applied atomically by [`super::StorageTree::apply_batch`]
///
/// Either every operation becomes visible or none does. Operations are applied in
/// insertion order, so a remove followed by an insert of the same key leaves the key
/// present.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Insert {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn remove(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Remove { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Failure reported by a driver or tree
#[derive(Error, Debug)]
pub enum StorageDriverError {
    /// Creating the data directory failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Row encoding or decoding failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Driver not available in this build
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// Error raised by the backend itself
    #[error("Storage driver error: {0}")]
    BackendSpecific(String),
}

impl From<bincode::Error> for StorageDriverError {
    fn from(e: bincode::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

/// Result type for storage driver operations
pub type StorageResult<T> = Result<T, StorageDriverError>;

/// Key-value pair yielded by tree scans
pub type KvPair = (Vec<u8>, Vec<u8>);
