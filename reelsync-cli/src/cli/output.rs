// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use super::commands::OutputFormat;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use reelsync::{CategoryListing, Movie, StoreStats};

/// Formatter for movie lists and cache statistics
pub struct MovieFormatter;

impl MovieFormatter {
    /// Format movies; `first_rank` is the 0-based position of the first one
    pub fn format_movies(
        title: &str,
        movies: &[Movie],
        first_rank: usize,
        format: OutputFormat,
    ) -> String {
        match format {
            OutputFormat::Table => Self::movies_table(title, movies, first_rank),
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "title": title,
                "first_rank": first_rank + 1,
                "movies": movies,
            })),
        }
    }

    pub fn format_listing(title: &str, listing: &CategoryListing, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => {
                let mut output = Self::movies_table(title, &listing.items, 0);
                if listing.from_cache {
                    output.push_str(&format!("{}\n", "Served from cache".dimmed()));
                }
                if let Some(e) = &listing.error {
                    output.push_str(&format!("{}\n", format!("⚠ {}", e).yellow()));
                }
                output
            }
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "title": title,
                "from_cache": listing.from_cache,
                "error": listing.error.as_ref().map(|e| e.to_string()),
                "movies": listing.items,
            })),
        }
    }

    pub fn format_stats(stats: &StoreStats, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::stats_table(stats),
            OutputFormat::Json => Self::to_json(&serde_json::json!({
                "total_rows": stats.total_rows,
                "partitions": stats.partitions.iter().map(|p| serde_json::json!({
                    "category": p.partition.category,
                    "language": p.partition.language,
                    "rows": p.rows,
                    "last_fetched_page": p.cursor.last_fetched_page,
                    "next_page": p.cursor.next_page,
                    "cursor_updated_at": p.cursor.cursor_updated_at,
                })).collect::<Vec<_>>(),
            })),
        }
    }

    fn movies_table(title: &str, movies: &[Movie], first_rank: usize) -> String {
        if movies.is_empty() {
            return format!("{}\n", "No results found".yellow());
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", title.bold().green()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(
            ["#", "Title", "Released", "Rating", "Votes"]
                .into_iter()
                .map(|col| Cell::new(col).fg(Color::Green)),
        );
        for (offset, movie) in movies.iter().enumerate() {
            table.add_row(vec![
                (first_rank + offset + 1).to_string(),
                movie.title.clone(),
                movie.release_date.clone().unwrap_or_default(),
                format!("{:.1}", movie.vote_average),
                movie.vote_count.to_string(),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn stats_table(stats: &StoreStats) -> String {
        if stats.partitions.is_empty() {
            return format!("{}\n", "Cache is empty".yellow());
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", "Cached partitions".bold().green()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(
            ["Category", "Language", "Rows", "Last page", "Next page"]
                .into_iter()
                .map(|col| Cell::new(col).fg(Color::Green)),
        );
        for partition in &stats.partitions {
            table.add_row(vec![
                partition.partition.category.to_string(),
                partition.partition.language.clone(),
                partition.rows.to_string(),
                Self::page_to_string(partition.cursor.last_fetched_page),
                partition
                    .cursor
                    .next_page
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "end".to_string()),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!("Total rows: {}\n", stats.total_rows));
        output
    }

    fn page_to_string(page: Option<u32>) -> String {
        page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
    }

    fn to_json(value: &serde_json::Value) -> String {
        let mut json = serde_json::to_string_pretty(value).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize results to JSON\"}".to_string()
        });
        json.push('\n');
        json
    }
}
