pub(crate) mod config;
pub(crate) mod games;
pub(crate) mod sync;

use std::path::{Path, PathBuf};

use meeple_bgg::{BggClient, BggConfig};
use meeple_catalog::{CatalogStore, LocalGame};
use meeple_db::SqliteStore;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;

pub(crate) fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meeple")
        .join("catalog.db")
}

/// Open the catalog database, creating it and its directory if needed.
pub(crate) fn open_store(db_path: &Path) -> Result<SqliteStore, CliError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    log::debug!("Using catalog database {}", db_path.display());
    Ok(SqliteStore::open(db_path)?)
}

/// Open an existing catalog database without creating one.
pub(crate) fn open_existing_store(db_path: &Path) -> Result<Option<SqliteStore>, CliError> {
    if !db_path.exists() {
        log::warn!("No catalog database found at {}", db_path.display());
        log::info!("Run 'meeple resolve <name>' or 'meeple import <id>' to create one.");
        return Ok(None);
    }
    Ok(Some(SqliteStore::open(db_path)?))
}

pub(crate) fn open_client() -> Result<BggClient, CliError> {
    let (config, _) = BggConfig::load()?;
    Ok(BggClient::new(config)?)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {}", e)))
}

/// Truncate a string to a maximum width in characters, appending "..." if needed.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max).collect()
    }
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Print one game in detail.
pub(crate) fn print_game(store: &SqliteStore, game: &LocalGame) -> Result<(), CliError> {
    let year = game
        .year_published
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    println!(
        "{}{}",
        game.name.if_supports_color(Stdout, |t| t.bold()),
        year.if_supports_color(Stdout, |t| t.dimmed()),
    );
    println!("  {:<12} {}", "Id:", game.id);
    println!("  {:<12} {}", "BGG id:", or_dash(game.external_id));
    println!("  {:<12} {}", "Rank:", or_dash(game.rank));
    println!(
        "  {:<12} {}",
        "Rating:",
        or_dash(game.average_rating.map(|r| format!("{:.2}", r)))
    );
    println!(
        "  {:<12} {}",
        "Weight:",
        or_dash(game.average_weight.map(|w| format!("{:.2}", w)))
    );
    let players = match (game.min_players, game.max_players) {
        (Some(min), Some(max)) if min == max => min.to_string(),
        (Some(min), Some(max)) => format!("{}-{}", min, max),
        (Some(min), None) => format!("{}+", min),
        (None, Some(max)) => format!("up to {}", max),
        (None, None) => "-".to_string(),
    };
    let solo = if game.supports_solo { ", solo" } else { "" };
    println!("  {:<12} {}{}", "Players:", players, solo);
    if !game.categories.is_empty() {
        println!("  {:<12} {}", "Categories:", game.categories.join(", "));
    }

    if let Some(ref base_id) = game.base_game_id {
        let base_name = store
            .find_by_id(base_id)?
            .map_or_else(|| base_id.clone(), |b| b.name);
        println!(
            "  {:<12} {}",
            "Expands:",
            base_name.if_supports_color(Stdout, |t| t.cyan())
        );
    } else if let Some(base_ext) = game.base_game_external_id {
        println!(
            "  {:<12} BGG #{} {}",
            "Expands:",
            base_ext,
            "(not imported yet)".if_supports_color(Stdout, |t| t.dimmed())
        );
    }

    let expansions = meeple_db::expansions_of(store.conn(), &game.id)?;
    if !expansions.is_empty() {
        println!("  {:<12} {}", "Expansions:", expansions.len());
        for expansion in &expansions {
            println!("    - {}", expansion.name);
        }
    }

    if !game.approved {
        println!(
            "  {}",
            "Awaiting approval".if_supports_color(Stdout, |t| t.yellow())
        );
    }
    if !game.description.is_empty() {
        let first_line = game.description.lines().next().unwrap_or_default();
        println!(
            "  {}",
            truncate_str(first_line, 100).if_supports_color(Stdout, |t| t.dimmed())
        );
    }
    Ok(())
}
