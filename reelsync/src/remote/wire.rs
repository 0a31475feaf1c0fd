// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! JSON shapes of the catalog API

use crate::error::{PagingError, PagingResult};
use crate::model::{Movie, PageResult};
use serde::{Deserialize, Serialize};

/// `{ results, page, total_pages, total_results }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListResponse {
    #[serde(default)]
    pub results: Option<Vec<MovieDto>>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDto {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl From<MovieDto> for Movie {
    fn from(dto: MovieDto) -> Self {
        Movie {
            id: dto.id,
            title: dto.title.unwrap_or_default(),
            overview: dto.overview.unwrap_or_default(),
            poster_path: dto.poster_path,
            backdrop_path: dto.backdrop_path,
            release_date: dto.release_date.filter(|d| !d.is_empty()),
            vote_average: dto.vote_average.unwrap_or_default(),
            vote_count: dto.vote_count.unwrap_or_default(),
            original_language: dto.original_language,
        }
    }
}

impl MovieListResponse {
    /// Domain page; a body without `results` counts as empty
    pub fn into_page(self, requested_page: u32) -> PagingResult<PageResult> {
        let results = self.results.ok_or(PagingError::EmptyResponse)?;
        Ok(PageResult {
            items: results.into_iter().map(Movie::from).collect(),
            page: if self.page == 0 { requested_page } else { self.page },
            total_pages: self.total_pages,
            total_results: self.total_results,
        })
    }
}
