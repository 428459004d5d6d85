//! Read queries for the game catalog.
//!
//! Provides lookup by id, external id and name, expansion listings, search,
//! and summary counts.

use meeple_catalog::types::{ExternalId, LocalGame, normalize_name};
use rusqlite::{Connection, OptionalExtension, params};

use crate::operations::OperationError;

const GAME_COLUMNS: &str = "id, name, description, image_url, external_id,
    catalog_rank, average_rating, average_weight, year_published,
    min_players, max_players, supports_solo, categories,
    base_game_id, base_game_external_id, approved, created_at, updated_at";

// ── Single-Game Lookups ─────────────────────────────────────────────────────

pub fn find_game_by_id(conn: &Connection, id: &str) -> Result<Option<LocalGame>, OperationError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_game)
        .optional()
        .map_err(Into::into)
}

pub fn find_game_by_external_id(
    conn: &Connection,
    external_id: ExternalId,
) -> Result<Option<LocalGame>, OperationError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE external_id = ?1");
    conn.query_row(&sql, params![external_id], row_to_game)
        .optional()
        .map_err(Into::into)
}

/// Find a game by name, ignoring case and surrounding whitespace.
///
/// Names are not unique; the oldest matching row wins.
pub fn find_game_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<LocalGame>, OperationError> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE name_key = ?1
         ORDER BY created_at, id LIMIT 1"
    );
    conn.query_row(&sql, params![normalize_name(name)], row_to_game)
        .optional()
        .map_err(Into::into)
}

pub fn exists_by_external_id(
    conn: &Connection,
    external_id: ExternalId,
) -> Result<bool, OperationError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM games WHERE external_id = ?1)",
        params![external_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ── Expansion Queries ───────────────────────────────────────────────────────

/// Games waiting on `external_id` as their base that are not yet linked to
/// the local game carrying it.
pub fn find_orphan_expansions_of(
    conn: &Connection,
    external_id: ExternalId,
) -> Result<Vec<LocalGame>, OperationError> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games
         WHERE base_game_external_id = ?1
           AND (base_game_id IS NULL
                OR base_game_id NOT IN (SELECT id FROM games WHERE external_id = ?1))
         ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![external_id], row_to_game)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Expansions linked locally to `base_id`.
pub fn expansions_of(conn: &Connection, base_id: &str) -> Result<Vec<LocalGame>, OperationError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE base_game_id = ?1 ORDER BY name_key");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![base_id], row_to_game)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Listings ────────────────────────────────────────────────────────────────

/// Search games by name substring (case-insensitive).
pub fn search_games(
    conn: &Connection,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<LocalGame>, OperationError> {
    let limit = limit.unwrap_or(100);
    let pattern = format!("%{}%", normalize_name(query));
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE name_key LIKE ?1
         ORDER BY name_key LIMIT {limit}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_game)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Every game backed by a catalog entry, oldest first.
pub fn games_with_external_id(conn: &Connection) -> Result<Vec<LocalGame>, OperationError> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE external_id IS NOT NULL ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_game)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Statistics ──────────────────────────────────────────────────────────────

/// Summary counts over the games table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameCounts {
    pub games: i64,
    pub expansions: i64,
    /// Expansions whose base is known only by external id.
    pub unlinked_expansions: i64,
    pub unapproved: i64,
}

pub fn count_games(conn: &Connection) -> Result<GameCounts, OperationError> {
    conn.query_row(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE base_game_id IS NOT NULL OR base_game_external_id IS NOT NULL),
                COUNT(*) FILTER (WHERE base_game_id IS NULL AND base_game_external_id IS NOT NULL),
                COUNT(*) FILTER (WHERE approved = 0)
         FROM games",
        [],
        |row| {
            Ok(GameCounts {
                games: row.get(0)?,
                expansions: row.get(1)?,
                unlinked_expansions: row.get(2)?,
                unapproved: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

// ── Row Mapping Helpers ─────────────────────────────────────────────────────

fn row_to_game(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocalGame> {
    let categories_json: String = row.get(12)?;
    let categories: Vec<String> = serde_json::from_str(&categories_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(LocalGame {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        external_id: row.get(4)?,
        rank: row.get(5)?,
        average_rating: row.get(6)?,
        average_weight: row.get(7)?,
        year_published: row.get(8)?,
        min_players: row.get(9)?,
        max_players: row.get(10)?,
        supports_solo: row.get(11)?,
        categories,
        base_game_id: row.get(13)?,
        base_game_external_id: row.get(14)?,
        approved: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}
