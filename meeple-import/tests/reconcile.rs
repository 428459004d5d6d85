use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use meeple_catalog::{
    CatalogEntry, CatalogStore, ExternalId, LocalGame, StoreError, ValidationError,
};
use meeple_db::{SqliteStore, count_games};
use meeple_import::{CatalogSource, ReconcileError, Reconciler};

/// In-memory catalog that counts every request.
#[derive(Default)]
struct FakeCatalog {
    entries: HashMap<ExternalId, CatalogEntry>,
    /// Lowercased query -> external id returned by `search_by_name`.
    search: HashMap<String, ExternalId>,
    /// Ids `fetch_by_id` pretends not to know.
    unavailable: RefCell<HashSet<ExternalId>>,
    searches: Cell<usize>,
    fetches: Cell<usize>,
}

impl FakeCatalog {
    fn with(mut self, entry: CatalogEntry) -> Self {
        self.search.insert(entry.name.to_lowercase(), entry.external_id);
        self.entries.insert(entry.external_id, entry);
        self
    }

    fn alias(mut self, query: &str, id: ExternalId) -> Self {
        self.search.insert(query.to_lowercase(), id);
        self
    }

    fn requests(&self) -> usize {
        self.searches.get() + self.fetches.get()
    }
}

impl CatalogSource for FakeCatalog {
    async fn search_by_name(&self, name: &str) -> Option<CatalogEntry> {
        self.searches.set(self.searches.get() + 1);
        let id = self.search.get(&name.trim().to_lowercase())?;
        self.entries.get(id).cloned()
    }

    async fn fetch_by_id(&self, id: ExternalId) -> Option<CatalogEntry> {
        self.fetches.set(self.fetches.get() + 1);
        if self.unavailable.borrow().contains(&id) {
            return None;
        }
        self.entries.get(&id).cloned()
    }

    async fn fetch_many_by_ids(&self, ids: &[ExternalId]) -> Vec<CatalogEntry> {
        self.fetches.set(self.fetches.get() + 1);
        ids.iter()
            .filter(|id| !self.unavailable.borrow().contains(id))
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }

    async fn fetch_hot_list(&self) -> Vec<CatalogEntry> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| CatalogEntry::new(id, self.entries[&id].name.clone()))
            .collect()
    }
}

fn catan() -> CatalogEntry {
    let mut entry = CatalogEntry::new(123, "Catan");
    entry.description = "Trade, build, settle.".to_string();
    entry.rank = Some(541);
    entry.min_players = Some(3);
    entry.max_players = Some(4);
    entry
}

fn seafarers() -> CatalogEntry {
    let mut entry = CatalogEntry::new(325, "Catan: Seafarers");
    entry.is_expansion = true;
    entry.base_external_id = Some(123);
    entry
}

fn game_count(store: &SqliteStore) -> i64 {
    count_games(store.conn()).unwrap().games
}

#[tokio::test]
async fn resolve_imports_exact_match() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan());
    let reconciler = Reconciler::new(&store, &catalog);

    let game = reconciler.resolve_or_import("Catan").await.unwrap().unwrap();
    assert_eq!(game.name, "Catan");
    assert_eq!(game.base_game_id, None);
    assert!(game.approved);

    let stored = store.find_by_external_id(123).unwrap().unwrap();
    assert_eq!(stored.id, game.id);
    assert_eq!(stored.rank, Some(541));
}

#[tokio::test]
async fn resolve_without_match_writes_nothing() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default();
    let reconciler = Reconciler::new(&store, &catalog);

    assert!(reconciler.resolve_or_import("Nope").await.unwrap().is_none());
    assert_eq!(game_count(&store), 0);
}

#[tokio::test]
async fn resolve_local_hit_skips_catalog() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan());
    let reconciler = Reconciler::new(&store, &catalog);

    let first = reconciler.resolve_or_import("Catan").await.unwrap().unwrap();
    let requests = catalog.requests();

    let second = reconciler.resolve_or_import("  cAtAn ").await.unwrap().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(catalog.requests(), requests);
}

#[tokio::test]
async fn resolve_blank_name_is_invalid() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default();
    let reconciler = Reconciler::new(&store, &catalog);

    let err = reconciler.resolve_or_import("   ").await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::BlankName)
    ));
    assert_eq!(catalog.requests(), 0);
}

#[tokio::test]
async fn aliases_resolving_to_one_external_id_create_one_game() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default()
        .with(catan())
        .alias("Settlers of Catan", 123);
    let reconciler = Reconciler::new(&store, &catalog);

    let a = reconciler.resolve_or_import("Catan").await.unwrap().unwrap();
    let b = reconciler
        .resolve_or_import("Settlers of Catan")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(game_count(&store), 1);
}

#[tokio::test]
async fn import_by_external_id_is_idempotent() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan());
    let reconciler = Reconciler::new(&store, &catalog);

    let first = reconciler.import_by_external_id(123).await.unwrap().unwrap();
    let fetches = catalog.fetches.get();
    let second = reconciler.import_by_external_id(123).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(catalog.fetches.get(), fetches);
    assert_eq!(game_count(&store), 1);
}

#[tokio::test]
async fn import_unknown_external_id_returns_none() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default();
    let reconciler = Reconciler::new(&store, &catalog);

    assert!(reconciler.import_by_external_id(9).await.unwrap().is_none());
    assert_eq!(game_count(&store), 0);
}

#[tokio::test]
async fn expansion_links_directly_to_stored_base() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan()).with(seafarers());
    let reconciler = Reconciler::new(&store, &catalog);

    let base = reconciler.import_by_external_id(123).await.unwrap().unwrap();
    let fetches = catalog.fetches.get();

    let expansion = reconciler
        .resolve_or_import("Catan: Seafarers")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expansion.base_game_id.as_deref(), Some(base.id.as_str()));
    assert_eq!(expansion.base_game_external_id, None);
    // No fetch for the base game.
    assert_eq!(catalog.fetches.get(), fetches);
}

#[tokio::test]
async fn expansion_imports_missing_base() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan()).with(seafarers());
    let reconciler = Reconciler::new(&store, &catalog);

    let expansion = reconciler.import_by_external_id(325).await.unwrap().unwrap();

    let base = store.find_by_external_id(123).unwrap().unwrap();
    assert_eq!(expansion.base_game_id.as_deref(), Some(base.id.as_str()));
    assert_eq!(expansion.base_game_external_id, None);
    assert!(!base.is_expansion());
    assert_eq!(game_count(&store), 2);
}

#[tokio::test]
async fn expansion_linkage_converges_when_base_arrives_later() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan()).with(seafarers());
    catalog.unavailable.borrow_mut().insert(123);
    let reconciler = Reconciler::new(&store, &catalog);

    let expansion = reconciler.import_by_external_id(325).await.unwrap().unwrap();
    assert_eq!(expansion.base_game_id, None);
    assert_eq!(expansion.base_game_external_id, Some(123));
    assert_eq!(game_count(&store), 1);

    catalog.unavailable.borrow_mut().clear();
    let base = reconciler.import_by_external_id(123).await.unwrap().unwrap();

    let relinked = store.find_by_id(&expansion.id).unwrap().unwrap();
    assert_eq!(relinked.base_game_id.as_deref(), Some(base.id.as_str()));
    assert_eq!(relinked.base_game_external_id, Some(123));
    assert!(store.find_orphan_expansions_of(123).unwrap().is_empty());
}

#[tokio::test]
async fn base_imported_for_one_expansion_relinks_others() {
    let store = SqliteStore::open_memory().unwrap();
    let mut cities = CatalogEntry::new(926, "Catan: Cities & Knights");
    cities.is_expansion = true;
    cities.base_external_id = Some(123);
    let catalog = FakeCatalog::default()
        .with(catan())
        .with(seafarers())
        .with(cities);
    let reconciler = Reconciler::new(&store, &catalog);

    catalog.unavailable.borrow_mut().insert(123);
    let early = reconciler.import_by_external_id(926).await.unwrap().unwrap();
    catalog.unavailable.borrow_mut().clear();

    // Importing Seafarers pulls in Catan, which must also adopt Cities & Knights.
    reconciler.import_by_external_id(325).await.unwrap().unwrap();
    let base = store.find_by_external_id(123).unwrap().unwrap();
    let early = store.find_by_id(&early.id).unwrap().unwrap();
    assert_eq!(early.base_game_id.as_deref(), Some(base.id.as_str()));
}

#[tokio::test]
async fn heuristic_expansion_without_base_is_stored_unlinked() {
    let store = SqliteStore::open_memory().unwrap();
    let mut guess = CatalogEntry::new(77, "Big Box Extras");
    guess.is_expansion = true;
    let catalog = FakeCatalog::default().with(guess);
    let reconciler = Reconciler::new(&store, &catalog);

    let game = reconciler.import_by_external_id(77).await.unwrap().unwrap();
    assert_eq!(game.base_game_id, None);
    assert_eq!(game.base_game_external_id, None);
}

#[tokio::test]
async fn heuristic_expansion_does_not_adopt_waiting_expansions() {
    let store = SqliteStore::open_memory().unwrap();
    let mut guess = CatalogEntry::new(77, "Big Box Extras");
    guess.is_expansion = true;
    let mut mini = CatalogEntry::new(500, "Big Box Extras: Minis");
    mini.is_expansion = true;
    mini.base_external_id = Some(77);
    let catalog = FakeCatalog::default().with(guess).with(mini);
    let reconciler = Reconciler::new(&store, &catalog);

    catalog.unavailable.borrow_mut().insert(77);
    let waiting = reconciler.import_by_external_id(500).await.unwrap().unwrap();
    catalog.unavailable.borrow_mut().clear();

    reconciler.import_by_external_id(77).await.unwrap().unwrap();

    let waiting = store.find_by_id(&waiting.id).unwrap().unwrap();
    assert_eq!(waiting.base_game_id, None);
    assert_eq!(waiting.base_game_external_id, Some(77));
    assert_eq!(store.find_orphan_expansions_of(77).unwrap().len(), 1);
}

#[tokio::test]
async fn self_referencing_catalog_entry_is_rejected() {
    let store = SqliteStore::open_memory().unwrap();
    let mut looped = CatalogEntry::new(55, "Ouroboros");
    looped.is_expansion = true;
    looped.base_external_id = Some(55);
    let catalog = FakeCatalog::default().with(looped);
    let reconciler = Reconciler::new(&store, &catalog);

    let err = reconciler.import_by_external_id(55).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(ValidationError::SelfReference(_))
    ));
    assert_eq!(game_count(&store), 0);
}

#[tokio::test]
async fn refresh_overwrites_catalog_fields() {
    let store = SqliteStore::open_memory().unwrap();
    let mut catalog = FakeCatalog::default().with(catan());
    let game = Reconciler::new(&store, &catalog)
        .import_by_external_id(123)
        .await
        .unwrap()
        .unwrap();

    let mut updated = catan();
    updated.name = "CATAN".to_string();
    updated.rank = Some(400);
    updated.min_players = Some(1);
    catalog.entries.insert(123, updated);

    let reconciler = Reconciler::new(&store, &catalog);
    assert!(reconciler.refresh_from_catalog(&game).await.unwrap());

    let stored = store.find_by_id(&game.id).unwrap().unwrap();
    assert_eq!(stored.name, "CATAN");
    assert_eq!(stored.rank, Some(400));
    assert!(stored.supports_solo);
    assert_eq!(stored.created_at, game.created_at);
}

#[tokio::test]
async fn refresh_fails_without_mutation() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default().with(catan());
    let reconciler = Reconciler::new(&store, &catalog);

    // No external id.
    let manual = LocalGame::manual("Homebrew");
    store.create(&manual).unwrap();
    assert!(!reconciler.refresh_from_catalog(&manual).await.unwrap());

    // Not stored.
    let ghost = LocalGame::from_entry(&catan());
    assert!(!reconciler.refresh_from_catalog(&ghost).await.unwrap());

    // Catalog cannot supply it.
    let game = reconciler.import_by_external_id(123).await.unwrap().unwrap();
    catalog.unavailable.borrow_mut().insert(123);
    assert!(!reconciler.refresh_from_catalog(&game).await.unwrap());
    assert_eq!(store.find_by_id(&game.id).unwrap().unwrap(), game);
}

/// Delegates to SQLite but fails every `create` of one external id, and
/// the next `failing_commits` commits.
struct FailingStore {
    inner: SqliteStore,
    fail_on: ExternalId,
    failing_commits: Cell<usize>,
}

impl FailingStore {
    fn new(fail_on: ExternalId) -> Self {
        Self {
            inner: SqliteStore::open_memory().unwrap(),
            fail_on,
            failing_commits: Cell::new(0),
        }
    }
}

impl CatalogStore for FailingStore {
    fn find_by_id(&self, id: &str) -> Result<Option<LocalGame>, StoreError> {
        self.inner.find_by_id(id)
    }
    fn find_by_external_id(&self, id: ExternalId) -> Result<Option<LocalGame>, StoreError> {
        self.inner.find_by_external_id(id)
    }
    fn find_by_name(&self, name: &str) -> Result<Option<LocalGame>, StoreError> {
        self.inner.find_by_name(name)
    }
    fn find_orphan_expansions_of(&self, id: ExternalId) -> Result<Vec<LocalGame>, StoreError> {
        self.inner.find_orphan_expansions_of(id)
    }
    fn exists_by_external_id(&self, id: ExternalId) -> Result<bool, StoreError> {
        self.inner.exists_by_external_id(id)
    }
    fn create(&self, game: &LocalGame) -> Result<(), StoreError> {
        if game.external_id == Some(self.fail_on) {
            return Err(StoreError::new(std::io::Error::other("disk full")));
        }
        self.inner.create(game)
    }
    fn update(&self, game: &LocalGame) -> Result<(), StoreError> {
        self.inner.update(game)
    }
    fn begin(&self) -> Result<(), StoreError> {
        self.inner.begin()
    }
    fn commit(&self) -> Result<(), StoreError> {
        if self.failing_commits.get() > 0 {
            self.failing_commits.set(self.failing_commits.get() - 1);
            return Err(StoreError::new(std::io::Error::other("database is locked")));
        }
        self.inner.commit()
    }
    fn rollback(&self) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}

#[tokio::test]
async fn storage_failure_propagates_and_rolls_back() {
    let store = FailingStore::new(325);
    let catalog = FakeCatalog::default().with(catan()).with(seafarers());
    let reconciler = Reconciler::new(&store, &catalog);

    let err = reconciler.import_by_external_id(325).await.unwrap_err();
    match err {
        ReconcileError::Store(store_err) => {
            assert_eq!(store_err.inner().to_string(), "disk full");
        }
        other => panic!("expected a storage error, got {other:?}"),
    }

    // The base game written earlier in the same unit of work is gone too.
    assert!(!store.exists_by_external_id(123).unwrap());
    assert_eq!(game_count(&store.inner), 0);
}

#[tokio::test]
async fn failed_commit_rolls_back_and_store_stays_usable() {
    let store = FailingStore::new(0);
    store.failing_commits.set(1);
    let catalog = FakeCatalog::default()
        .with(catan())
        .with(CatalogEntry::new(822, "Carcassonne"));
    let reconciler = Reconciler::new(&store, &catalog);

    let err = reconciler.import_by_external_id(123).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Store(_)));
    assert!(store.inner.conn().is_autocommit());
    assert_eq!(game_count(&store.inner), 0);

    let game = reconciler.import_by_external_id(822).await.unwrap().unwrap();
    assert_eq!(game.name, "Carcassonne");
    assert_eq!(game_count(&store.inner), 1);
}

#[tokio::test]
async fn failed_refresh_commit_rolls_back() {
    let store = FailingStore::new(0);
    let catalog = FakeCatalog::default().with(catan());
    let reconciler = Reconciler::new(&store, &catalog);
    let game = reconciler.import_by_external_id(123).await.unwrap().unwrap();

    store.failing_commits.set(1);
    let err = reconciler
        .refresh_many(std::slice::from_ref(&game), &meeple_import::SilentProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Store(_)));
    assert!(store.inner.conn().is_autocommit());

    let stats = reconciler
        .refresh_many(&[game], &meeple_import::SilentProgress)
        .await
        .unwrap();
    assert_eq!(stats.refreshed, 1);
}

#[tokio::test]
async fn refresh_many_counts_each_outcome() {
    let store = SqliteStore::open_memory().unwrap();
    let mut carcassonne = CatalogEntry::new(822, "Carcassonne");
    carcassonne.rank = Some(200);
    let mut catalog = FakeCatalog::default().with(catan()).with(carcassonne);

    let (catan_game, carc_game) = {
        let reconciler = Reconciler::new(&store, &catalog);
        (
            reconciler.import_by_external_id(123).await.unwrap().unwrap(),
            reconciler.import_by_external_id(822).await.unwrap().unwrap(),
        )
    };
    let manual = LocalGame::manual("Homebrew");
    store.create(&manual).unwrap();

    let mut renamed = catan();
    renamed.name = "Catan (5th Edition)".to_string();
    catalog.entries.insert(123, renamed);
    catalog.unavailable.borrow_mut().insert(822);

    let reconciler = Reconciler::new(&store, &catalog);
    let fetches = catalog.fetches.get();
    let stats = reconciler
        .refresh_many(
            &[catan_game.clone(), carc_game, manual],
            &meeple_import::SilentProgress,
        )
        .await
        .unwrap();

    assert_eq!(
        stats,
        meeple_import::RefreshStats {
            refreshed: 1,
            skipped: 1,
            not_found: 1,
            missing: 0,
        }
    );
    // One batched request for both linked games.
    assert_eq!(catalog.fetches.get(), fetches + 1);
    let stored = store.find_by_id(&catan_game.id).unwrap().unwrap();
    assert_eq!(stored.name, "Catan (5th Edition)");
}

#[tokio::test]
async fn import_hot_list_skips_present_games() {
    let store = SqliteStore::open_memory().unwrap();
    let catalog = FakeCatalog::default()
        .with(catan())
        .with(seafarers())
        .with(CatalogEntry::new(822, "Carcassonne"));
    let reconciler = Reconciler::new(&store, &catalog);

    reconciler.import_by_external_id(822).await.unwrap();
    let stats = reconciler
        .import_hot_list(&meeple_import::SilentProgress)
        .await
        .unwrap();

    // Catan is listed first and imported; Seafarers links to it.
    assert_eq!(stats.listed, 3);
    assert_eq!(stats.imported, 2);
    assert_eq!(stats.already_present, 1);
    assert_eq!(game_count(&store), 3);

    let base = store.find_by_external_id(123).unwrap().unwrap();
    let expansion = store.find_by_external_id(325).unwrap().unwrap();
    assert_eq!(expansion.base_game_id.as_deref(), Some(base.id.as_str()));
}
