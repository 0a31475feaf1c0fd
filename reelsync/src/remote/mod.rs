// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Remote paged client
//!
//! Stateless accessor for one page of a catalog listing or of a search. No retries happen
//! here; transport timeouts surface as [`PagingError::Network`](crate::error::PagingError).

pub mod http;
pub mod wire;

pub use http::HttpCatalogClient;

use crate::error::PagingResult;
use crate::model::{PageResult, PartitionKey};
use async_trait::async_trait;

#[async_trait]
pub trait RemotePagedClient: Send + Sync {
    /// One page (1-based) of the partition's category listing in the partition's language
    async fn fetch_page(&self, partition: &PartitionKey, page: u32) -> PagingResult<PageResult>;

    /// One page (1-based) of free-text search results
    async fn search_page(&self, query: &str, language: &str, page: u32)
        -> PagingResult<PageResult>;
}
