// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for Reelsync

use colored::Colorize;
use std::io::Write;

use super::commands::{Cli, OutputFormat};
use super::output::MovieFormatter;
use reelsync::{Category, MovieCatalog, ReelsyncConfig, StorageType};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Defaults, then the config file, then environment, then flags
pub fn load_config(cli: &Cli) -> Result<ReelsyncConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ReelsyncConfig::load(path)?,
        None => ReelsyncConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(dir) = &cli.data_dir {
        config.storage.path = dir.clone();
    }
    if cli.memory {
        config.storage.storage_type = StorageType::Memory;
    }
    config.validate()?;
    Ok(config)
}

fn open_catalog(
    config: ReelsyncConfig,
    language: Option<String>,
) -> Result<MovieCatalog, Box<dyn std::error::Error>> {
    let catalog = MovieCatalog::from_config(config)?;
    if let Some(language) = language {
        catalog.set_language(language);
    }
    Ok(catalog)
}

/// Handle the browse command
pub async fn handle_browse(
    config: ReelsyncConfig,
    category: Category,
    language: Option<String>,
    pages: usize,
    refresh: bool,
    format: OutputFormat,
) -> CliResult {
    let catalog = open_catalog(config, language)?;
    let mut stream = catalog.movies(category);

    let mut snapshot = if refresh {
        let ticket = stream.refresh();
        stream.wait_for(|s| s.is_refreshed(ticket)).await
    } else {
        stream.settled().await
    }
    .ok_or("stream stopped")?;
    if let Some(e) = snapshot.refresh.error() {
        eprintln!("{}", format!("Refresh failed: {}", e).yellow());
        if snapshot.items.is_empty() {
            catalog.shutdown()?;
            return Err(e.clone().into());
        }
        eprintln!("{}", "Showing cached results".yellow());
    }

    let mut shown = 0;
    for page in 1..=pages.max(1) {
        if page > 1 {
            if snapshot.append.is_end_reached() {
                break;
            }
            stream.load_more();
            snapshot = stream
                .wait_for(|s| {
                    s.is_idle()
                        && (s.items.len() > shown
                            || s.append.is_end_reached()
                            || s.append.error().is_some())
                })
                .await
                .ok_or("stream stopped")?;
            if let Some(e) = snapshot.append.error() {
                eprintln!("{}", format!("Loading page {} failed: {}", page, e).red());
                break;
            }
        }
        if snapshot.items.len() > shown {
            let title = format!("{} ({}) page {}", category, stream.partition().language, page);
            print!(
                "{}",
                MovieFormatter::format_movies(&title, &snapshot.items[shown..], shown, format)
            );
            shown = snapshot.items.len();
        }
    }

    if snapshot.append.is_end_reached() {
        println!("{}", "End of listing".dimmed());
    }
    catalog.shutdown()?;
    Ok(())
}

/// Handle the search command
pub async fn handle_search(
    config: ReelsyncConfig,
    query: String,
    language: Option<String>,
    pages: usize,
    format: OutputFormat,
) -> CliResult {
    let catalog = open_catalog(config, language)?;
    let mut stream = catalog.search(&query).await?;
    if let Some(e) = stream.snapshot().refresh.error() {
        catalog.shutdown()?;
        return Err(e.clone().into());
    }

    for _ in 1..pages.max(1) {
        if !stream.load_more().await? {
            break;
        }
    }

    let title = format!(
        "Search \"{}\": {} of {} results",
        stream.query(),
        stream.items().len(),
        stream.total_results()
    );
    print!(
        "{}",
        MovieFormatter::format_movies(&title, stream.items(), 0, format)
    );
    catalog.shutdown()?;
    Ok(())
}

/// Handle the home command
pub async fn handle_home(
    config: ReelsyncConfig,
    category: Category,
    language: Option<String>,
    refresh: bool,
    format: OutputFormat,
) -> CliResult {
    let catalog = open_catalog(config, language)?;
    let listing = catalog.home(category, refresh).await?;
    let title = format!("Home row: {} ({})", category, catalog.language());
    print!("{}", MovieFormatter::format_listing(&title, &listing, format));
    catalog.shutdown()?;
    Ok(())
}

/// Handle the stats command
pub async fn handle_stats(config: ReelsyncConfig, format: OutputFormat) -> CliResult {
    let catalog = open_catalog(config, None)?;
    let stats = catalog.cache_stats().await?;
    print!("{}", MovieFormatter::format_stats(&stats, format));
    catalog.shutdown()?;
    Ok(())
}

/// Handle the clear command
pub async fn handle_clear(config: ReelsyncConfig, yes: bool) -> CliResult {
    if !yes {
        print!("Drop every cached row at {:?}? [y/N] ", config.storage.path);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("{}", "Aborted".yellow());
            return Ok(());
        }
    }

    let catalog = open_catalog(config, None)?;
    catalog.clear_cache().await?;
    catalog.shutdown()?;
    println!("{}", "✅ Cache cleared".green());
    Ok(())
}
