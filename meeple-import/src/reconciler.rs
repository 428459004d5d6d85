//! Get-or-import for catalog games.
//!
//! The store is consulted first, the catalog only on a miss. External ids
//! are the dedup key: a name that resolves to an external id already present
//! locally returns the existing row instead of creating a second one.
//!
//! Each import is a single unit of work. All catalog requests for it (the
//! entry and, for expansions, its base) finish before the store transaction
//! opens, so no network wait ever holds the write lock.

use meeple_catalog::{
    CatalogEntry, CatalogStore, ExternalId, LocalGame, ValidationError, now_timestamp,
};

use crate::error::ReconcileError;
use crate::source::CatalogSource;

/// Rows one import will write, resolved before the transaction opens.
struct ImportPlan {
    game: LocalGame,
    /// The catalog flags the game as an expansion, heuristically or not.
    game_is_expansion: bool,
    /// Base game fetched from the catalog because it was not stored yet,
    /// with its own catalog expansion flag.
    new_base: Option<(LocalGame, bool)>,
}

/// Reconciles requested games between a local store and a catalog.
pub struct Reconciler<'a, S, C> {
    store: &'a S,
    catalog: &'a C,
}

impl<'a, S: CatalogStore, C: CatalogSource> Reconciler<'a, S, C> {
    pub fn new(store: &'a S, catalog: &'a C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn catalog(&self) -> &'a C {
        self.catalog
    }

    /// Return the local game called `name`, importing it from the catalog
    /// when no local game has that name.
    ///
    /// Returns `Ok(None)` when the catalog has no match.
    pub async fn resolve_or_import(&self, name: &str) -> Result<Option<LocalGame>, ReconcileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankName.into());
        }

        if let Some(game) = self.store.find_by_name(name)? {
            log::debug!("'{}' found locally as {}", name, game.id);
            return Ok(Some(game));
        }

        let Some(entry) = self.catalog.search_by_name(name).await else {
            log::info!("No catalog match for '{}'", name);
            return Ok(None);
        };

        if let Some(existing) = self.store.find_by_external_id(entry.external_id)? {
            log::info!(
                "'{}' matched catalog game {} already stored as '{}'",
                name,
                entry.external_id,
                existing.name
            );
            return Ok(Some(existing));
        }

        self.import_entry(entry).await.map(Some)
    }

    /// Return the local game for `external_id`, importing it if needed.
    ///
    /// Idempotent: when the game is already stored no catalog request is made.
    pub async fn import_by_external_id(
        &self,
        external_id: ExternalId,
    ) -> Result<Option<LocalGame>, ReconcileError> {
        if let Some(existing) = self.store.find_by_external_id(external_id)? {
            return Ok(Some(existing));
        }

        let Some(entry) = self.catalog.fetch_by_id(external_id).await else {
            log::info!("Catalog game {} not found", external_id);
            return Ok(None);
        };

        self.import_entry(entry).await.map(Some)
    }

    /// Overwrite a stored game's catalog-derived fields with fresh data.
    ///
    /// Returns `Ok(false)`, without writing, if the game has no external id,
    /// is no longer stored, or the catalog cannot supply it.
    pub async fn refresh_from_catalog(&self, game: &LocalGame) -> Result<bool, ReconcileError> {
        let Some(external_id) = game.external_id else {
            log::debug!("'{}' has no external id; nothing to refresh", game.name);
            return Ok(false);
        };
        let Some(mut current) = self.store.find_by_id(&game.id)? else {
            log::warn!("Cannot refresh '{}': game {} is not stored", game.name, game.id);
            return Ok(false);
        };
        let Some(entry) = self.catalog.fetch_by_id(external_id).await else {
            return Ok(false);
        };

        current.apply_entry(&entry);
        current.validate()?;
        self.store.update(&current)?;
        log::info!("Refreshed '{}' from catalog game {}", current.name, external_id);
        Ok(true)
    }

    /// Create a new game from `entry`, linking or importing its base game.
    async fn import_entry(&self, entry: CatalogEntry) -> Result<LocalGame, ReconcileError> {
        let plan = self.plan_import(&entry).await?;

        self.store.begin()?;
        let result = self
            .persist(plan)
            .and_then(|game| self.store.commit().map(|()| game).map_err(Into::into));
        if result.is_err() {
            if let Err(rollback) = self.store.rollback() {
                log::warn!("Rollback after failed import also failed: {}", rollback);
            }
        }
        result
    }

    /// Resolve the new row and its base. Performs catalog requests, never writes.
    async fn plan_import(&self, entry: &CatalogEntry) -> Result<ImportPlan, ReconcileError> {
        let mut game = LocalGame::from_entry(entry);
        let mut new_base = None;

        match entry.base_external_id {
            Some(base_id) if entry.is_expansion => {
                if base_id == entry.external_id {
                    return Err(ValidationError::SelfReference(game.id).into());
                }

                if let Some(base) = self.store.find_by_external_id(base_id)? {
                    game.link_base(&base)?;
                } else if let Some(base_entry) = self.catalog.fetch_by_id(base_id).await {
                    let base = self.base_from_entry(&base_entry)?;
                    game.link_base(&base)?;
                    new_base = Some((base, base_entry.is_expansion));
                } else {
                    log::info!(
                        "Base game {} of '{}' is unavailable; linking later",
                        base_id,
                        game.name
                    );
                    game.base_game_external_id = Some(base_id);
                }
            }
            _ if entry.is_expansion => {
                log::info!("'{}' looks like an expansion but names no base game", game.name);
            }
            _ => {}
        }

        if let Some((ref base, _)) = new_base {
            base.validate()?;
        }
        game.validate()?;
        Ok(ImportPlan {
            game,
            game_is_expansion: entry.is_expansion,
            new_base,
        })
    }

    /// Build a freshly fetched base game. Its own base, if any, is linked only
    /// when already stored; otherwise it is recorded by external id.
    fn base_from_entry(&self, entry: &CatalogEntry) -> Result<LocalGame, ReconcileError> {
        let mut base = LocalGame::from_entry(entry);
        if let (true, Some(grandparent)) = (entry.is_expansion, entry.base_external_id) {
            if grandparent == entry.external_id {
                log::warn!("Ignoring self-referencing base on '{}'", base.name);
            } else if let Some(stored) = self.store.find_by_external_id(grandparent)? {
                base.link_base(&stored)?;
            } else {
                base.base_game_external_id = Some(grandparent);
            }
        }
        Ok(base)
    }

    /// Write a planned import. Runs inside the unit of work.
    fn persist(&self, plan: ImportPlan) -> Result<LocalGame, ReconcileError> {
        let ImportPlan {
            mut game,
            game_is_expansion,
            new_base,
        } = plan;

        // Another import may have stored this game since the plan was made.
        if let Some(external_id) = game.external_id {
            if let Some(existing) = self.store.find_by_external_id(external_id)? {
                log::debug!("Catalog game {} was stored concurrently", external_id);
                return Ok(existing);
            }
        }

        if let Some((base, base_is_expansion)) = new_base {
            let stored = match base.external_id {
                Some(id) => self.store.find_by_external_id(id)?,
                None => None,
            };
            let base = match stored {
                Some(stored) => stored,
                None => {
                    self.store.create(&base)?;
                    log::info!("Imported base game '{}' ({})", base.name, base.id);
                    if !base_is_expansion {
                        self.relink_orphans(&base)?;
                    }
                    base
                }
            };
            game.link_base(&base)?;
        }

        self.store.create(&game)?;
        log::info!("Imported '{}' ({})", game.name, game.id);

        if !game_is_expansion {
            self.relink_orphans(&game)?;
        }
        Ok(game)
    }

    /// Point expansions waiting on `base`'s external id at `base`.
    ///
    /// `base_game_external_id` is kept on the relinked rows.
    fn relink_orphans(&self, base: &LocalGame) -> Result<usize, ReconcileError> {
        let Some(external_id) = base.external_id else {
            return Ok(0);
        };

        let mut relinked = 0;
        for mut orphan in self.store.find_orphan_expansions_of(external_id)? {
            if orphan.id == base.id {
                continue;
            }
            orphan.link_base(base)?;
            orphan.updated_at = now_timestamp();
            self.store.update(&orphan)?;
            log::info!("Linked expansion '{}' to '{}'", orphan.name, base.name);
            relinked += 1;
        }
        Ok(relinked)
    }
}
