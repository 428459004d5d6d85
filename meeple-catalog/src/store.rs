//! Persistence contract consumed by the importer.

use crate::error::StoreError;
use crate::types::{ExternalId, LocalGame};

/// The handful of storage operations catalog reconciliation needs.
///
/// Writes between [`begin`](Self::begin) and [`commit`](Self::commit) form
/// one unit of work; [`rollback`](Self::rollback) discards them.
pub trait CatalogStore {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalGame>, StoreError>;

    fn find_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<LocalGame>, StoreError>;

    /// Lookup by normalized name (trimmed, case-insensitive).
    fn find_by_name(&self, name: &str) -> Result<Option<LocalGame>, StoreError>;

    /// Games that record `external_id` as their base but are not yet linked
    /// to the local game carrying that external id.
    fn find_orphan_expansions_of(
        &self,
        external_id: ExternalId,
    ) -> Result<Vec<LocalGame>, StoreError>;

    fn exists_by_external_id(&self, external_id: ExternalId) -> Result<bool, StoreError>;

    fn create(&self, game: &LocalGame) -> Result<(), StoreError>;

    fn update(&self, game: &LocalGame) -> Result<(), StoreError>;

    fn begin(&self) -> Result<(), StoreError>;

    fn commit(&self) -> Result<(), StoreError>;

    fn rollback(&self) -> Result<(), StoreError>;
}
