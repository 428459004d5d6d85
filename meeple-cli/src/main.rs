//! meeple CLI
//!
//! Keep a local board game catalog in sync with BoardGameGeek.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

pub(crate) use error::CliError;

#[derive(Parser)]
#[command(name = "meeple")]
#[command(about = "Keep a local board game catalog in sync with BoardGameGeek", long_about = None)]
struct Cli {
    /// Catalog database file (default: <data dir>/meeple/catalog.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Show debug output (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a game by name, importing it from BoardGameGeek if it is not stored
    Resolve {
        /// Game name (case-insensitive)
        name: String,
    },

    /// Import a game by its BoardGameGeek id
    Import {
        /// BoardGameGeek id
        id: u32,
    },

    /// Re-fetch catalog data for stored games
    Refresh {
        /// Local game id (e.g., gam-01j...)
        #[arg(required_unless_present = "all")]
        game_id: Option<String>,

        /// Refresh every game that has a BoardGameGeek id
        #[arg(long, conflicts_with = "game_id")]
        all: bool,
    },

    /// Show the BoardGameGeek hot list
    Hot {
        /// Import every listed game
        #[arg(long)]
        import: bool,
    },

    /// Search BoardGameGeek without importing anything
    Suggest {
        /// Search text
        query: String,

        /// Results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Results to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show stored games whose name contains the given text
    Show {
        /// Name or part of a name
        name: String,
    },

    /// Add a game by hand (stored unapproved, without catalog data)
    Add {
        /// Game name
        name: String,
    },

    /// Approve a manually added game
    Approve {
        /// Local game id
        game_id: String,
    },

    /// Show catalog database statistics
    Stats,

    /// Manage BoardGameGeek client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings and their sources
    Show,

    /// Print the config file path
    Path,

    /// Store a BoardGameGeek API token in the config file
    SetToken {
        /// API token
        token: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".if_supports_color(Stderr, |t| t.red()), e);
        std::process::exit(1);
    }
}

/// `--verbose`/`--quiet` pick the level; `RUST_LOG` overrides it.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Warn,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = cli.db.unwrap_or_else(commands::default_db_path);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Resolve { name } => commands::games::run_resolve(&db_path, &name, quiet),
        Commands::Import { id } => commands::games::run_import(&db_path, id, quiet),
        Commands::Refresh { game_id, all } => {
            commands::sync::run_refresh(&db_path, game_id.as_deref(), all, quiet)
        }
        Commands::Hot { import } => commands::sync::run_hot(&db_path, import, quiet),
        Commands::Suggest {
            query,
            offset,
            limit,
        } => commands::sync::run_suggest(&query, offset, limit, quiet),
        Commands::Show { name } => commands::games::run_show(&db_path, &name),
        Commands::Add { name } => commands::games::run_add(&db_path, &name),
        Commands::Approve { game_id } => commands::games::run_approve(&db_path, &game_id),
        Commands::Stats => commands::games::run_stats(&db_path),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(),
            ConfigAction::Path => commands::config::run_config_path(),
            ConfigAction::SetToken { token } => commands::config::run_config_set_token(&token),
        },
    }
}
