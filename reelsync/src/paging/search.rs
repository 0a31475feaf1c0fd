// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Network-only search pager
//!
//! Nothing is persisted. Page links are derived from the last response alone.

use super::pager::{LoadState, PagingSnapshot};
use crate::config::SearchConfig;
use crate::error::{PagingError, PagingResult};
use crate::model::{Movie, PageResult};
use crate::remote::RemotePagedClient;
use log::debug;
use std::sync::Arc;

/// One page of search results with its neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub items: Vec<Movie>,
    pub page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub total_results: u64,
}

impl From<PageResult> for SearchPage {
    fn from(result: PageResult) -> Self {
        let page = result.page;
        Self {
            items: result.items,
            page,
            prev_page: if page > 1 { Some(page - 1) } else { None },
            next_page: if page < result.total_pages {
                Some(page + 1)
            } else {
                None
            },
            total_results: result.total_results,
        }
    }
}

#[derive(Clone)]
pub struct SearchPager {
    remote: Arc<dyn RemotePagedClient>,
    config: SearchConfig,
}

impl SearchPager {
    pub fn new(remote: Arc<dyn RemotePagedClient>, config: SearchConfig) -> Self {
        Self { remote, config }
    }

    /// Trimmed query, or a validation error when it is out of bounds
    pub fn validate_query(&self, query: &str) -> PagingResult<String> {
        let trimmed = query.trim();
        let len = trimmed.chars().count();
        if len < self.config.min_query_len {
            return Err(PagingError::validation(format!(
                "query must be at least {} characters",
                self.config.min_query_len
            )));
        }
        if len > self.config.max_query_len {
            return Err(PagingError::validation(format!(
                "query must be at most {} characters",
                self.config.max_query_len
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Fetch one page; validation happens before any network call
    pub async fn fetch(&self, query: &str, language: &str, page: u32) -> PagingResult<SearchPage> {
        let query = self.validate_query(query)?;
        let result = self.remote.search_page(&query, language, page).await?;
        debug!(
            "Search {:?} page {}: {} results",
            query,
            result.page,
            result.items.len()
        );
        Ok(SearchPage::from(result))
    }

    /// Accumulating stream over the pages of `query`, not yet loaded
    pub fn stream(&self, query: &str, language: &str) -> PagingResult<SearchStream> {
        let query = self.validate_query(query)?;
        Ok(SearchStream {
            pager: self.clone(),
            query,
            language: language.to_string(),
            items: Vec::new(),
            next_page: Some(1),
            last_page: None,
            total_results: 0,
            refresh: LoadState::default(),
            append: LoadState::default(),
        })
    }
}

/// Search results accumulated page by page
pub struct SearchStream {
    pager: SearchPager,
    query: String,
    language: String,
    items: Vec<Movie>,
    next_page: Option<u32>,
    last_page: Option<SearchPage>,
    total_results: u64,
    refresh: LoadState,
    append: LoadState,
}

impl SearchStream {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    /// The most recently loaded page
    pub fn last_page(&self) -> Option<&SearchPage> {
        self.last_page.as_ref()
    }

    pub fn snapshot(&self) -> PagingSnapshot {
        PagingSnapshot {
            items: self.items.clone(),
            refresh: self.refresh.clone(),
            append: self.append.clone(),
            // Search refreshes are awaited directly; there are no tickets to report
            refreshed: 0,
        }
    }

    pub fn is_end_reached(&self) -> bool {
        self.last_page.is_some() && self.next_page.is_none()
    }

    /// Start over from page 1. Loaded items are kept until the new page arrives.
    pub async fn refresh(&mut self) -> PagingResult<()> {
        self.refresh = LoadState::Loading;
        match self.pager.fetch(&self.query, &self.language, 1).await {
            Ok(page) => {
                self.items.clear();
                self.accept(page);
                self.refresh = LoadState::default();
                Ok(())
            }
            Err(e) => {
                self.refresh = LoadState::Error(e.clone());
                Err(e)
            }
        }
    }

    /// Load the next page. Returns false when there was nothing left to load.
    pub async fn load_more(&mut self) -> PagingResult<bool> {
        if self.last_page.is_none() {
            self.refresh().await?;
            return Ok(true);
        }
        let page = match self.next_page {
            Some(page) => page,
            None => return Ok(false),
        };
        self.append = LoadState::Loading;
        match self.pager.fetch(&self.query, &self.language, page).await {
            Ok(page) => {
                self.accept(page);
                Ok(true)
            }
            Err(e) => {
                self.append = LoadState::Error(e.clone());
                Err(e)
            }
        }
    }

    fn accept(&mut self, page: SearchPage) {
        self.next_page = page.next_page;
        self.total_results = page.total_results;
        self.items.extend(page.items.iter().cloned());
        self.append = LoadState::NotLoading {
            end_reached: page.next_page.is_none(),
        };
        self.last_page = Some(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links() {
        let first = SearchPage::from(PageResult {
            items: Vec::new(),
            page: 1,
            total_pages: 3,
            total_results: 50,
        });
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = SearchPage::from(PageResult {
            items: Vec::new(),
            page: 3,
            total_pages: 3,
            total_results: 50,
        });
        assert_eq!(last.prev_page, Some(2));
        assert_eq!(last.next_page, None);
    }
}
