// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Domain types shared by the store, the remote client, and the pagers

use crate::cache::CacheMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated catalog listings served by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NowPlaying,
    Popular,
    TopRated,
    Upcoming,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::NowPlaying,
        Category::Popular,
        Category::TopRated,
        Category::Upcoming,
    ];

    /// Path segment used by the remote API
    pub fn path(&self) -> &'static str {
        match self {
            Category::NowPlaying => "now_playing",
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "now_playing" => Ok(Category::NowPlaying),
            "popular" => Ok(Category::Popular),
            "top_rated" => Ok(Category::TopRated),
            "upcoming" => Ok(Category::Upcoming),
            _ => Err(format!(
                "Unknown category: {}. Valid options: now_playing, popular, top_rated, upcoming",
                s
            )),
        }
    }
}

/// Cache partition: one category in one language
///
/// A language change is a different partition, never an update of an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub category: Category,
    pub language: String,
}

impl PartitionKey {
    pub fn new(category: Category, language: impl Into<String>) -> Self {
        Self {
            category,
            language: language.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.language)
    }
}

/// Catalog entry as the rest of the application sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub original_language: Option<String>,
}

/// One cached occurrence of a movie inside a partition
///
/// `id` alone is not unique: the same movie may appear in several partitions.
/// `(partition, position)` is the identity the store relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedItem {
    pub movie: Movie,
    pub partition: PartitionKey,
    /// Remote page this row was fetched as part of
    pub page: u32,
    /// 0-based rank within the partition, contiguous across pages
    pub position: u64,
    pub cache_metadata: CacheMetadata,
}

/// Pagination cursor of one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionCursor {
    pub partition: PartitionKey,
    /// `None` means the partition was never fetched
    pub last_fetched_page: Option<u32>,
    /// `None` means the end of the listing was reached
    pub next_page: Option<u32>,
    pub cursor_updated_at: i64,
}

impl PartitionCursor {
    /// Cursor after successfully fetching `page` out of `total_pages`
    pub fn after_fetch(partition: PartitionKey, page: u32, total_pages: u32, now: i64) -> Self {
        Self {
            partition,
            last_fetched_page: Some(page),
            next_page: if page < total_pages { Some(page + 1) } else { None },
            cursor_updated_at: now,
        }
    }

    pub fn is_end_reached(&self) -> bool {
        self.last_fetched_page.is_some() && self.next_page.is_none()
    }
}

/// One page of results as returned by the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}
