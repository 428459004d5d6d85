//! Write operations for games.

use meeple_catalog::types::{LocalGame, normalize_name, now_timestamp};
use rusqlite::{Connection, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("Category list could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

impl OperationError {
    fn game_not_found(id: &str) -> Self {
        Self::NotFound {
            entity_type: "game".to_string(),
            id: id.to_string(),
        }
    }
}

/// Insert a new game row.
///
/// Fails with a constraint error if another game already carries the same
/// external id.
pub fn insert_game(conn: &Connection, game: &LocalGame) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO games (id, name, name_key, description, image_url, external_id,
                            catalog_rank, average_rating, average_weight, year_published,
                            min_players, max_players, supports_solo, categories,
                            base_game_id, base_game_external_id, approved,
                            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            game.id,
            game.name,
            normalize_name(&game.name),
            game.description,
            game.image_url,
            game.external_id,
            game.rank,
            game.average_rating,
            game.average_weight,
            game.year_published,
            game.min_players,
            game.max_players,
            game.supports_solo,
            serde_json::to_string(&game.categories)?,
            game.base_game_id,
            game.base_game_external_id,
            game.approved,
            game.created_at,
            game.updated_at,
        ],
    )?;
    Ok(())
}

/// Overwrite every column of an existing game except `id` and `created_at`.
pub fn update_game(conn: &Connection, game: &LocalGame) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE games SET
             name = ?2,
             name_key = ?3,
             description = ?4,
             image_url = ?5,
             external_id = ?6,
             catalog_rank = ?7,
             average_rating = ?8,
             average_weight = ?9,
             year_published = ?10,
             min_players = ?11,
             max_players = ?12,
             supports_solo = ?13,
             categories = ?14,
             base_game_id = ?15,
             base_game_external_id = ?16,
             approved = ?17,
             updated_at = ?18
         WHERE id = ?1",
        params![
            game.id,
            game.name,
            normalize_name(&game.name),
            game.description,
            game.image_url,
            game.external_id,
            game.rank,
            game.average_rating,
            game.average_weight,
            game.year_published,
            game.min_players,
            game.max_players,
            game.supports_solo,
            serde_json::to_string(&game.categories)?,
            game.base_game_id,
            game.base_game_external_id,
            game.approved,
            game.updated_at,
        ],
    )?;
    if changed == 0 {
        return Err(OperationError::game_not_found(&game.id));
    }
    Ok(())
}

/// Mark a manually entered game as reviewed.
pub fn approve_game(conn: &Connection, game_id: &str) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE games SET approved = 1, updated_at = ?2 WHERE id = ?1",
        params![game_id, now_timestamp()],
    )?;
    if changed == 0 {
        return Err(OperationError::game_not_found(game_id));
    }
    Ok(())
}
