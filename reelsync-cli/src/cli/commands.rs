// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use reelsync::Category;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reelsync")]
#[command(version, about = "Offline-first movie catalog browser", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file (missing file means defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of the on-disk cache
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true)]
    pub memory: bool,

    /// Content language, e.g. en-US
    #[arg(short = 'l', long, global = true)]
    pub language: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse a category page by page
    Browse {
        #[arg(short, long, default_value = "popular")]
        category: Category,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Refetch from the network regardless of freshness
        #[arg(short, long)]
        refresh: bool,
    },

    /// Search the catalog
    Search {
        query: String,

        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// Show the bounded home row of a category
    Home {
        #[arg(short, long, default_value = "popular")]
        category: Category,

        #[arg(short, long)]
        refresh: bool,
    },

    /// Show what the cache holds
    Stats,

    /// Drop every cached row
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
