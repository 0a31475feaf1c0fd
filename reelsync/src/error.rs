// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the paging and caching core
//!
//! None of these are fatal: every failure is reported to the caller next to whatever
//! cached data is already visible.

use crate::storage::persistent::StorageDriverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    /// No connectivity, connection reset, or timeout
    #[error("Network error: {cause}")]
    Network { cause: String },

    /// Non-2xx response from the catalog API
    #[error("API error: HTTP {http_code}")]
    Api { http_code: u16 },

    /// 2xx response whose body was missing or could not be parsed
    #[error("Empty or malformed response body")]
    EmptyResponse,

    /// Rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PagingError {
    pub fn network<S: Into<String>>(cause: S) -> Self {
        Self::Network {
            cause: cause.into(),
        }
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether retrying the same request can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            PagingError::Network { .. } | PagingError::Storage(_) => true,
            PagingError::Api { http_code } => *http_code == 429 || *http_code >= 500,
            PagingError::EmptyResponse | PagingError::Validation(_) => false,
        }
    }
}

impl From<StorageDriverError> for PagingError {
    fn from(err: StorageDriverError) -> Self {
        PagingError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for PagingError {
    fn from(err: bincode::Error) -> Self {
        PagingError::Storage(format!("row encoding: {}", err))
    }
}

pub type PagingResult<T> = Result<T, PagingError>;
