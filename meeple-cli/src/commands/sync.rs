use std::path::Path;

use meeple_catalog::CatalogStore;
use meeple_import::Reconciler;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;
use crate::progress::{batch_progress, spinner};

use super::{open_client, open_existing_store, open_store, print_game, runtime, truncate_str};

pub(crate) fn run_refresh(
    db_path: &Path,
    game_id: Option<&str>,
    all: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let Some(store) = open_existing_store(db_path)? else {
        return Ok(());
    };
    let client = open_client()?;
    let rt = runtime()?;
    let reconciler = Reconciler::new(&store, &client);

    if all {
        let games = meeple_db::games_with_external_id(store.conn())?;
        if games.is_empty() {
            println!("No games with a BoardGameGeek id to refresh");
            return Ok(());
        }

        let progress = batch_progress(quiet);
        let stats = rt.block_on(reconciler.refresh_many(&games, progress.as_ref()))?;

        println!(
            "{} {} games",
            "Refreshed".if_supports_color(Stdout, |t| t.green()),
            stats.refreshed
        );
        if stats.not_found > 0 {
            println!(
                "  {} not returned by BoardGameGeek",
                stats.not_found.if_supports_color(Stdout, |t| t.yellow())
            );
        }
        if stats.missing > 0 {
            println!("  {} no longer stored", stats.missing);
        }
        return Ok(());
    }

    let Some(game_id) = game_id else {
        return Err(CliError::not_found("Give a game id or --all"));
    };
    let Some(game) = store.find_by_id(game_id)? else {
        return Err(CliError::not_found(format!("No game with id {}", game_id)));
    };

    let pb = spinner(format!("Refreshing '{}'", game.name), quiet);
    let refreshed = rt.block_on(reconciler.refresh_from_catalog(&game));
    pb.finish_and_clear();

    if refreshed? {
        if let Some(updated) = store.find_by_id(game_id)? {
            print_game(&store, &updated)?;
        }
    } else {
        println!(
            "{} '{}' was not changed",
            "Skipped:".if_supports_color(Stdout, |t| t.yellow()),
            game.name
        );
    }
    Ok(())
}

pub(crate) fn run_hot(db_path: &Path, import: bool, quiet: bool) -> Result<(), CliError> {
    let client = open_client()?;
    let rt = runtime()?;

    if import {
        let store = open_store(db_path)?;
        let reconciler = Reconciler::new(&store, &client);
        let progress = batch_progress(quiet);
        let stats = rt.block_on(reconciler.import_hot_list(progress.as_ref()))?;

        println!(
            "{} {} of {} trending games",
            "Imported".if_supports_color(Stdout, |t| t.green()),
            stats.imported,
            stats.listed
        );
        if stats.already_present > 0 {
            println!("  {} already stored", stats.already_present);
        }
        if stats.not_found > 0 {
            println!(
                "  {} could not be fetched",
                stats.not_found.if_supports_color(Stdout, |t| t.yellow())
            );
        }
        return Ok(());
    }

    let pb = spinner("Fetching hot list", quiet);
    let hot = rt.block_on(client.fetch_hot_list());
    pb.finish_and_clear();

    if hot.is_empty() {
        println!("The hot list is empty or unavailable");
        return Ok(());
    }

    // Only mark stored games when a database already exists.
    let store = if db_path.exists() {
        Some(meeple_db::SqliteStore::open(db_path)?)
    } else {
        None
    };
    for (i, entry) in hot.iter().enumerate() {
        let year = entry
            .year_published
            .map(|y| format!("({})", y))
            .unwrap_or_default();
        let stored = match &store {
            Some(store) => store.exists_by_external_id(entry.external_id)?,
            None => false,
        };
        let marker = if stored { "*" } else { " " };
        println!(
            "  {:>3}. {} {:<44} {:>6} {:>8}",
            i + 1,
            marker.if_supports_color(Stdout, |t| t.green()),
            truncate_str(&entry.name, 44),
            year,
            entry.external_id,
        );
    }
    if store.is_some() {
        println!();
        println!("  * already in the catalog");
    }
    Ok(())
}

pub(crate) fn run_suggest(
    query: &str,
    offset: usize,
    limit: usize,
    quiet: bool,
) -> Result<(), CliError> {
    let client = open_client()?;
    let rt = runtime()?;

    let pb = spinner(format!("Searching for '{}'", query), quiet);
    let suggestions = rt.block_on(client.search_suggestions(query, offset, limit));
    pb.finish_and_clear();

    if suggestions.is_empty() {
        println!("No suggestions for '{}'", query);
        return Ok(());
    }

    for (i, s) in suggestions.iter().enumerate() {
        let year = s
            .year_published
            .map(|y| format!("({})", y))
            .unwrap_or_default();
        let name = truncate_str(&s.name, 44);
        if s.is_expansion {
            println!(
                "  {:>3}. {:<44} {:>6} {:>8} {}",
                offset + i + 1,
                name,
                year,
                s.external_id,
                "expansion".if_supports_color(Stdout, |t| t.dimmed())
            );
        } else {
            println!(
                "  {:>3}. {:<44} {:>6} {:>8}",
                offset + i + 1,
                name,
                year,
                s.external_id
            );
        }
    }
    Ok(())
}
