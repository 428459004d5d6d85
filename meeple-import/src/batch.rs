//! Batch operations built on the [`Reconciler`].

use std::collections::HashMap;

use meeple_catalog::{CatalogEntry, CatalogStore, ExternalId, LocalGame};

use crate::error::ReconcileError;
use crate::progress::ImportProgress;
use crate::reconciler::Reconciler;
use crate::source::CatalogSource;

/// Statistics from [`Reconciler::refresh_many`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshStats {
    pub refreshed: usize,
    /// Games without an external id.
    pub skipped: usize,
    /// Games the catalog did not return.
    pub not_found: usize,
    /// Games deleted from the store since they were listed.
    pub missing: usize,
}

/// Statistics from [`Reconciler::import_hot_list`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HotListStats {
    pub listed: usize,
    pub imported: usize,
    pub already_present: usize,
    pub not_found: usize,
}

impl<S: CatalogStore, C: CatalogSource> Reconciler<'_, S, C> {
    /// Refresh many stored games from the catalog using batched requests.
    ///
    /// All updates are written as one unit of work after the catalog
    /// requests finish.
    pub async fn refresh_many(
        &self,
        games: &[LocalGame],
        progress: &dyn ImportProgress,
    ) -> Result<RefreshStats, ReconcileError> {
        let mut stats = RefreshStats::default();

        let ids: Vec<ExternalId> = games.iter().filter_map(|g| g.external_id).collect();
        stats.skipped = games.len() - ids.len();

        progress.on_phase(&format!("Fetching {} games from the catalog", ids.len()));
        let fresh: HashMap<ExternalId, CatalogEntry> = self
            .catalog()
            .fetch_many_by_ids(&ids)
            .await
            .into_iter()
            .map(|e| (e.external_id, e))
            .collect();

        self.store().begin()?;
        let result = self
            .apply_refresh(games, &fresh, &mut stats, progress)
            .and_then(|()| self.store().commit().map_err(Into::into));
        if let Err(e) = result {
            if let Err(rollback) = self.store().rollback() {
                log::warn!("Rollback after failed refresh also failed: {}", rollback);
            }
            return Err(e);
        }

        progress.on_complete(&format!(
            "Refreshed {} games ({} not found, {} without external id)",
            stats.refreshed, stats.not_found, stats.skipped
        ));
        Ok(stats)
    }

    fn apply_refresh(
        &self,
        games: &[LocalGame],
        fresh: &HashMap<ExternalId, CatalogEntry>,
        stats: &mut RefreshStats,
        progress: &dyn ImportProgress,
    ) -> Result<(), ReconcileError> {
        let linked: Vec<(&LocalGame, ExternalId)> = games
            .iter()
            .filter_map(|g| g.external_id.map(|id| (g, id)))
            .collect();
        let total = linked.len();

        for (i, (game, external_id)) in linked.into_iter().enumerate() {
            progress.on_game(i + 1, total, &game.name);

            let Some(entry) = fresh.get(&external_id) else {
                log::warn!("Catalog did not return '{}' ({})", game.name, external_id);
                stats.not_found += 1;
                continue;
            };
            let Some(mut current) = self.store().find_by_id(&game.id)? else {
                stats.missing += 1;
                continue;
            };

            current.apply_entry(entry);
            current.validate()?;
            self.store().update(&current)?;
            stats.refreshed += 1;
        }
        Ok(())
    }

    /// Import every game on the catalog's trending list.
    pub async fn import_hot_list(
        &self,
        progress: &dyn ImportProgress,
    ) -> Result<HotListStats, ReconcileError> {
        let hot = self.catalog().fetch_hot_list().await;
        let mut stats = HotListStats {
            listed: hot.len(),
            ..Default::default()
        };
        progress.on_phase(&format!("Importing {} trending games", hot.len()));

        for (i, entry) in hot.iter().enumerate() {
            progress.on_game(i + 1, hot.len(), &entry.name);

            if self.store().exists_by_external_id(entry.external_id)? {
                stats.already_present += 1;
                continue;
            }
            match self.import_by_external_id(entry.external_id).await? {
                Some(_) => stats.imported += 1,
                None => stats.not_found += 1,
            }
        }

        progress.on_complete(&format!(
            "Imported {} of {} trending games ({} already present)",
            stats.imported, stats.listed, stats.already_present
        ));
        Ok(stats)
    }
}
