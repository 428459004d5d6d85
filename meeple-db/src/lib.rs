//! SQLite persistence layer for the game catalog.
//!
//! Provides schema creation, write operations, and query APIs backed by
//! SQLite (via rusqlite with bundled feature), plus [`SqliteStore`], the
//! [`meeple_catalog::CatalogStore`] implementation the importer uses.

pub mod operations;
pub mod queries;
pub mod schema;
pub mod store;

pub use operations::{OperationError, approve_game, insert_game, update_game};
pub use queries::{
    GameCounts, count_games, exists_by_external_id, expansions_of, find_game_by_external_id,
    find_game_by_id, find_game_by_name, find_orphan_expansions_of, games_with_external_id,
    search_games,
};
pub use schema::{SchemaError, open_database, open_memory};
pub use store::SqliteStore;
