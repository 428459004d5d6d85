use std::path::Path;

use meeple_catalog::{CatalogStore, ExternalId, LocalGame};
use meeple_import::Reconciler;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;
use crate::progress::spinner;

use super::{open_client, open_existing_store, open_store, print_game, runtime, truncate_str};

pub(crate) fn run_resolve(db_path: &Path, name: &str, quiet: bool) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let client = open_client()?;
    let rt = runtime()?;

    let reconciler = Reconciler::new(&store, &client);
    let pb = spinner(format!("Resolving '{}'", name), quiet);
    let result = rt.block_on(reconciler.resolve_or_import(name));
    pb.finish_and_clear();

    match result? {
        Some(game) => print_game(&store, &game),
        None => Err(CliError::not_found(format!(
            "No game named '{}' on BoardGameGeek",
            name
        ))),
    }
}

pub(crate) fn run_import(db_path: &Path, id: ExternalId, quiet: bool) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let client = open_client()?;
    let rt = runtime()?;

    let reconciler = Reconciler::new(&store, &client);
    let pb = spinner(format!("Importing BGG #{}", id), quiet);
    let result = rt.block_on(reconciler.import_by_external_id(id));
    pb.finish_and_clear();

    match result? {
        Some(game) => print_game(&store, &game),
        None => Err(CliError::not_found(format!(
            "BoardGameGeek has no game #{}",
            id
        ))),
    }
}

pub(crate) fn run_show(db_path: &Path, name: &str) -> Result<(), CliError> {
    let Some(store) = open_existing_store(db_path)? else {
        return Ok(());
    };

    if let Some(game) = store.find_by_name(name)? {
        return print_game(&store, &game);
    }

    let matches = meeple_db::search_games(store.conn(), name, Some(50))?;
    match matches.as_slice() {
        [] => Err(CliError::not_found(format!("No stored game matches '{}'", name))),
        [game] => print_game(&store, game),
        games => {
            print_game_table(games);
            Ok(())
        }
    }
}

pub(crate) fn run_add(db_path: &Path, name: &str) -> Result<(), CliError> {
    let store = open_store(db_path)?;

    if let Some(existing) = store.find_by_name(name)? {
        println!(
            "{} '{}' is already stored as {}",
            "Exists:".if_supports_color(Stdout, |t| t.yellow()),
            existing.name,
            existing.id,
        );
        return Ok(());
    }

    let game = LocalGame::manual(name);
    game.validate().map_err(meeple_import::ReconcileError::from)?;
    store.create(&game)?;
    println!(
        "{} '{}' as {} (awaiting approval)",
        "Added".if_supports_color(Stdout, |t| t.green()),
        game.name,
        game.id,
    );
    Ok(())
}

pub(crate) fn run_approve(db_path: &Path, game_id: &str) -> Result<(), CliError> {
    let Some(store) = open_existing_store(db_path)? else {
        return Ok(());
    };

    let Some(game) = store.find_by_id(game_id)? else {
        return Err(CliError::not_found(format!("No game with id {}", game_id)));
    };
    if game.approved {
        println!("'{}' is already approved", game.name);
        return Ok(());
    }

    meeple_db::approve_game(store.conn(), game_id)?;
    println!(
        "{} '{}'",
        "Approved".if_supports_color(Stdout, |t| t.green()),
        game.name
    );
    Ok(())
}

pub(crate) fn run_stats(db_path: &Path) -> Result<(), CliError> {
    let Some(store) = open_existing_store(db_path)? else {
        return Ok(());
    };

    let counts = meeple_db::count_games(store.conn())?;

    println!(
        "{}",
        "Catalog Database Statistics".if_supports_color(Stdout, |t| t.bold()),
    );
    println!("  Database: {}", db_path.display());
    println!();
    println!("  Games:               {:>8}", counts.games);
    println!("  Expansions:          {:>8}", counts.expansions);
    println!(
        "  Awaiting base game:  {:>8}",
        counts.unlinked_expansions
    );
    println!("  Awaiting approval:   {:>8}", counts.unapproved);
    Ok(())
}

fn print_game_table(games: &[LocalGame]) {
    println!(
        "  {:<44} {:>6} {:>8} {:>6}",
        "Name".if_supports_color(Stdout, |t| t.bold()),
        "Year".if_supports_color(Stdout, |t| t.bold()),
        "BGG id".if_supports_color(Stdout, |t| t.bold()),
        "Rank".if_supports_color(Stdout, |t| t.bold()),
    );
    for game in games {
        let year = game.year_published.map(|y| y.to_string()).unwrap_or_default();
        let ext = game.external_id.map(|i| i.to_string()).unwrap_or_default();
        let rank = game.rank.map(|r| r.to_string()).unwrap_or_default();
        let name = truncate_str(&game.name, 44);
        if game.is_expansion() {
            println!(
                "  {:<44} {:>6} {:>8} {:>6}",
                name.if_supports_color(Stdout, |t| t.dimmed()),
                year,
                ext,
                rank
            );
        } else {
            println!("  {:<44} {:>6} {:>8} {:>6}", name, year, ext, rank);
        }
    }
    println!();
    println!("  {} games", games.len());
}
