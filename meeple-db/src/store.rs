//! [`CatalogStore`] backed by a SQLite connection.

use std::path::Path;

use meeple_catalog::{CatalogStore, ExternalId, LocalGame, StoreError};
use rusqlite::Connection;

use crate::operations::{self, OperationError};
use crate::queries;
use crate::schema::{self, SchemaError};

/// SQLite catalog store.
///
/// `begin` opens an immediate transaction so the write lock is taken up
/// front rather than on the first write.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, SchemaError> {
        Ok(Self::new(schema::open_database(path)?))
    }

    pub fn open_memory() -> Result<Self, SchemaError> {
        Ok(Self::new(schema::open_memory()?))
    }

    /// The underlying connection, for queries outside the store contract.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn store_err(e: impl Into<OperationError>) -> StoreError {
    StoreError::new(e.into())
}

impl CatalogStore for SqliteStore {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalGame>, StoreError> {
        queries::find_game_by_id(&self.conn, id).map_err(store_err)
    }

    fn find_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<LocalGame>, StoreError> {
        queries::find_game_by_external_id(&self.conn, external_id).map_err(store_err)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<LocalGame>, StoreError> {
        queries::find_game_by_name(&self.conn, name).map_err(store_err)
    }

    fn find_orphan_expansions_of(
        &self,
        external_id: ExternalId,
    ) -> Result<Vec<LocalGame>, StoreError> {
        queries::find_orphan_expansions_of(&self.conn, external_id).map_err(store_err)
    }

    fn exists_by_external_id(&self, external_id: ExternalId) -> Result<bool, StoreError> {
        queries::exists_by_external_id(&self.conn, external_id).map_err(store_err)
    }

    fn create(&self, game: &LocalGame) -> Result<(), StoreError> {
        operations::insert_game(&self.conn, game).map_err(store_err)
    }

    fn update(&self, game: &LocalGame) -> Result<(), StoreError> {
        operations::update_game(&self.conn, game).map_err(store_err)
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(store_err)
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT").map_err(store_err)
    }

    fn rollback(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK").map_err(store_err)
    }
}
