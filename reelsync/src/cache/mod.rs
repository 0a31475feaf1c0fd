// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache freshness metadata
//!
//! Every cached row embeds a [`CacheMetadata`] stamped when it was written. Freshness
//! of a whole partition is judged from one sample row (the first position).

pub mod cache_config;

pub use cache_config::CacheConfig;

use serde::{Deserialize, Serialize};

/// Per-row freshness and versioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the row was written (epoch millis)
    pub cached_at: i64,
    /// When the row stops being fresh (epoch millis)
    pub expires_at: i64,
    /// Pinned rows never expire
    pub is_persistent: bool,
    /// Shape version of the cached payload
    pub cache_version: u32,
}

impl CacheMetadata {
    pub fn new(cached_at: i64, ttl_millis: i64, cache_version: u32) -> Self {
        Self {
            cached_at,
            expires_at: cached_at.saturating_add(ttl_millis),
            is_persistent: false,
            cache_version,
        }
    }

    pub fn persistent(cached_at: i64, cache_version: u32) -> Self {
        Self {
            cached_at,
            expires_at: i64::MAX,
            is_persistent: true,
            cache_version,
        }
    }

    pub fn is_valid(&self, now: i64) -> bool {
        self.is_persistent || now < self.expires_at
    }

    /// Valid and written with the current payload shape
    pub fn is_fresh(&self, now: i64, current_version: u32) -> bool {
        self.cache_version == current_version && self.is_valid(now)
    }

    pub fn pinned(self) -> Self {
        Self {
            is_persistent: true,
            ..self
        }
    }
}
