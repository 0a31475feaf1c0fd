// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration and freshness policy

use super::CacheMetadata;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Freshness policy applied to every row the cache writes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long fetched rows stay fresh
    pub ttl: Duration,

    /// Bump when the cached payload shape changes; older rows are treated as expired
    pub cache_version: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600), // 1 hour
            cache_version: 1,
        }
    }
}

impl CacheConfig {
    /// Configuration where every row is stale as soon as it is written
    pub fn always_stale() -> Self {
        Self {
            ttl: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Metadata for a row written at `now`
    pub fn stamp(&self, now: i64) -> CacheMetadata {
        CacheMetadata::new(now, self.ttl_millis(), self.cache_version)
    }

    pub fn is_fresh(&self, metadata: &CacheMetadata, now: i64) -> bool {
        metadata.is_fresh(now, self.cache_version)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_version == 0 {
            return Err("cache_version must be > 0".to_string());
        }
        Ok(())
    }
}
