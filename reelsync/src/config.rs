// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Runtime configuration
//!
//! Defaults, then an optional JSON file, then environment overrides.

use crate::cache::CacheConfig;
use crate::storage::StorageType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the cache lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sled,
            path: PathBuf::from("reelsync-data"),
        }
    }
}

/// Stream assembly parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PagingConfig {
    /// Rows read from the local store per step
    pub page_size: usize,
    /// Load more once the consumer is this close to the end of loaded rows
    pub prefetch_distance: usize,
    /// Rows exposed by the first snapshot
    pub initial_load_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_distance: 5,
            initial_load_size: 20,
        }
    }
}

/// Search query bounds, in characters after trimming
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub min_query_len: usize,
    pub max_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            max_query_len: 100,
        }
    }
}

/// Bounded home-row lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HomeConfig {
    pub list_size: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self { list_size: 20 }
    }
}

/// Catalog API endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Listings are served at `{base_url}/{category}`
    pub base_url: String,
    /// Search is served at `{base_url}/{search_path}`
    pub search_path: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3/movie/".to_string(),
            search_path: "search".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReelsyncConfig {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub paging: PagingConfig,
    pub search: SearchConfig,
    pub home: HomeConfig,
    pub api: ApiConfig,
    /// Language used until the locale collaborator sets one
    pub default_language: String,
}

impl Default for ReelsyncConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            paging: PagingConfig::default(),
            search: SearchConfig::default(),
            home: HomeConfig::default(),
            api: ApiConfig::default(),
            default_language: "en-US".to_string(),
        }
    }
}

impl ReelsyncConfig {
    /// Configuration for ephemeral caches that never touch disk
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                path: PathBuf::new(),
            },
            ..Self::default()
        }
    }

    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Apply `REELSYNC_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(key) = lookup("REELSYNC_API_KEY").filter(|k| !k.is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(url) = lookup("REELSYNC_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(dir) = lookup("REELSYNC_DATA_DIR") {
            self.storage.path = PathBuf::from(dir);
        }
        if let Some(kind) = lookup("REELSYNC_STORAGE") {
            match kind.parse::<StorageType>() {
                Ok(storage_type) => self.storage.storage_type = storage_type,
                Err(e) => log::warn!("Ignoring REELSYNC_STORAGE: {}", e),
            }
        }
        if let Some(language) = lookup("REELSYNC_LANGUAGE") {
            self.default_language = language;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;

        if self.paging.page_size == 0 {
            return Err("paging.page_size must be > 0".to_string());
        }
        if self.paging.prefetch_distance == 0 {
            return Err("paging.prefetch_distance must be > 0".to_string());
        }
        if self.paging.initial_load_size == 0 {
            return Err("paging.initial_load_size must be > 0".to_string());
        }
        if self.search.min_query_len == 0 || self.search.min_query_len > self.search.max_query_len {
            return Err(format!(
                "search bounds must satisfy 0 < min ({}) <= max ({})",
                self.search.min_query_len, self.search.max_query_len
            ));
        }
        if self.home.list_size == 0 {
            return Err("home.list_size must be > 0".to_string());
        }
        if self.api.base_url.trim().is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if self.default_language.trim().is_empty() {
            return Err("default_language must not be empty".to_string());
        }
        Ok(())
    }
}
