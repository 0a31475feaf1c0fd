// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! HTTP implementation of the remote paged client

use super::wire::MovieListResponse;
use super::RemotePagedClient;
use crate::config::ApiConfig;
use crate::error::{PagingError, PagingResult};
use crate::model::{PageResult, PartitionKey};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;

#[derive(Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Url,
    search_path: String,
    api_key: Option<String>,
}

fn transport_error(err: reqwest::Error) -> PagingError {
    if err.is_timeout() {
        PagingError::network(format!("timed out: {}", err))
    } else {
        PagingError::network(err.to_string())
    }
}

impl HttpCatalogClient {
    pub fn new(config: &ApiConfig) -> PagingResult<Self> {
        // Url::join drops the last segment of a base without a trailing slash
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| PagingError::validation(format!("invalid base URL {}: {}", base, e)))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PagingError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url,
            search_path: config.search_path.trim_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> PagingResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PagingError::validation(format!("failed to build URL for {}: {}", path, e)))
    }

    async fn get_page(
        &self,
        url: Url,
        params: &[(&str, String)],
        requested_page: u32,
    ) -> PagingResult<PageResult> {
        let mut request = self.http.get(url.clone()).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key)]);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            debug!("GET {} page {} -> {}", url, requested_page, status);
            return Err(PagingError::Api {
                http_code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Err(PagingError::EmptyResponse);
        }
        let parsed: MovieListResponse =
            serde_json::from_str(&body).map_err(|_| PagingError::EmptyResponse)?;
        let page = parsed.into_page(requested_page)?;
        debug!(
            "GET {} page {}/{} -> {} items",
            url,
            page.page,
            page.total_pages,
            page.items.len()
        );
        Ok(page)
    }
}

#[async_trait]
impl RemotePagedClient for HttpCatalogClient {
    async fn fetch_page(&self, partition: &PartitionKey, page: u32) -> PagingResult<PageResult> {
        let url = self.url(partition.category.path())?;
        let params = [
            ("page", page.to_string()),
            ("language", partition.language.clone()),
        ];
        self.get_page(url, &params, page).await
    }

    async fn search_page(
        &self,
        query: &str,
        language: &str,
        page: u32,
    ) -> PagingResult<PageResult> {
        let url = self.url(&self.search_path)?;
        let params = [
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("language", language.to_string()),
        ];
        self.get_page(url, &params, page).await
    }
}
