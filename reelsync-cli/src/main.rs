// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reelsync CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments first to get log level
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // Can still be overridden by RUST_LOG
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Commands::Version = cli.command {
        println!("{} {}", "Reelsync".bold().green(), reelsync::VERSION);
        println!("Offline-first paginated movie catalog cache");
        return Ok(());
    }

    let config = cli::load_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Browse {
                category,
                pages,
                refresh,
            } => {
                cli::handle_browse(config, category, cli.language, pages, refresh, cli.format)
                    .await
            }

            Commands::Search { query, pages } => {
                cli::handle_search(config, query, cli.language, pages, cli.format).await
            }

            Commands::Home { category, refresh } => {
                cli::handle_home(config, category, cli.language, refresh, cli.format).await
            }

            Commands::Stats => cli::handle_stats(config, cli.format).await,

            Commands::Clear { yes } => cli::handle_clear(config, yes).await,

            Commands::Version => Ok(()),
        }
    })
}
