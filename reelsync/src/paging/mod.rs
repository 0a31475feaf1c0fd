// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Paging
//!
//! - [`mediator`]: decides when a partition needs the network and commits the result
//! - [`pager`]: turns the local store and the mediator into a growing stream per partition
//! - [`search`]: network-only pages for free-text queries

pub mod mediator;
pub mod pager;
pub mod search;

pub use mediator::{LoadType, MediatorOutcome, PagingMediator};
pub use pager::{LoadState, PagingSnapshot, PagingStream};
pub use search::{SearchPage, SearchPager, SearchStream};
