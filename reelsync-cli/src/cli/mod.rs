// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for Reelsync
//!
//! Browses cached category listings page by page, runs searches, shows home rows,
//! and inspects or clears the local cache.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_browse, handle_clear, handle_home, handle_search, handle_stats, load_config,
};
