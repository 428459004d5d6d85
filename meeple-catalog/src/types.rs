//! Data model types for the board game catalog.
//!
//! [`CatalogEntry`] is what the external catalog says about a game;
//! [`LocalGame`] is the row this application owns. The importer is the only
//! code that turns the former into the latter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier assigned by the external catalog.
pub type ExternalId = u32;

/// Prefix for locally generated game ids.
pub const GAME_ID_PREFIX: &str = "gam-";

// ── Catalog Entry ───────────────────────────────────────────────────────────

/// A game as described by the external catalog. Fetched, never owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub external_id: ExternalId,
    pub name: String,
    /// Plain text: markup stripped, entities decoded.
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    /// Average user rating on a 0-10 scale.
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Average complexity weight (1-5 in practice).
    #[serde(default)]
    pub average_weight: Option<f64>,
    #[serde(default)]
    pub year_published: Option<i32>,
    #[serde(default)]
    pub min_players: Option<u32>,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub is_expansion: bool,
    /// Set when the source links this expansion to its base game.
    #[serde(default)]
    pub base_external_id: Option<ExternalId>,
}

impl CatalogEntry {
    /// A bare entry with only an id and name, everything else unknown.
    pub fn new(external_id: ExternalId, name: impl Into<String>) -> Self {
        Self {
            external_id,
            name: name.into(),
            description: String::new(),
            image_url: None,
            rank: None,
            average_rating: None,
            average_weight: None,
            year_published: None,
            min_players: None,
            max_players: None,
            categories: BTreeSet::new(),
            is_expansion: false,
            base_external_id: None,
        }
    }

    pub fn supports_solo(&self) -> bool {
        self.min_players == Some(1)
    }
}

// ── Suggestion ──────────────────────────────────────────────────────────────

/// Lightweight search listing row used for autocomplete-style suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub external_id: ExternalId,
    pub name: String,
    pub year_published: Option<i32>,
    pub image_url: Option<String>,
    pub is_expansion: bool,
}

// ── Local Game ──────────────────────────────────────────────────────────────

/// A game row owned by the local catalog store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalGame {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Unique across the store when present.
    pub external_id: Option<ExternalId>,
    pub rank: Option<u32>,
    pub average_rating: Option<f64>,
    pub average_weight: Option<f64>,
    pub year_published: Option<i32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub supports_solo: bool,
    pub categories: Vec<String>,
    pub base_game_id: Option<String>,
    /// Base game known only by its external id (not imported yet).
    pub base_game_external_id: Option<ExternalId>,
    pub approved: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl LocalGame {
    /// Build a new, unlinked game from a catalog entry.
    ///
    /// Catalog imports are approved on creation; only manual entries wait
    /// for review.
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        let now = now_timestamp();
        let mut game = Self {
            id: new_game_id(),
            name: String::new(),
            description: String::new(),
            image_url: None,
            external_id: Some(entry.external_id),
            rank: None,
            average_rating: None,
            average_weight: None,
            year_published: None,
            min_players: None,
            max_players: None,
            supports_solo: false,
            categories: Vec::new(),
            base_game_id: None,
            base_game_external_id: None,
            approved: true,
            created_at: now.clone(),
            updated_at: now,
        };
        game.copy_entry_fields(entry);
        game
    }

    /// A manually entered game with no catalog backing.
    pub fn manual(name: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: new_game_id(),
            name: name.into(),
            description: String::new(),
            image_url: None,
            external_id: None,
            rank: None,
            average_rating: None,
            average_weight: None,
            year_published: None,
            min_players: None,
            max_players: None,
            supports_solo: false,
            categories: Vec::new(),
            base_game_id: None,
            base_game_external_id: None,
            approved: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// True when the game is linked, or waiting to be linked, to a base game.
    pub fn is_expansion(&self) -> bool {
        self.base_game_id.is_some() || self.base_game_external_id.is_some()
    }

    /// Overwrite the catalog-derived fields from a fresh catalog entry.
    ///
    /// Linkage, approval and identity are left alone.
    pub fn apply_entry(&mut self, entry: &CatalogEntry) {
        self.copy_entry_fields(entry);
        self.updated_at = now_timestamp();
    }

    /// Link this game to a local base game.
    pub fn link_base(&mut self, base: &LocalGame) -> Result<(), ValidationError> {
        self.link_base_id(&base.id)
    }

    /// Link this game to a base game by local id.
    pub fn link_base_id(&mut self, base_id: &str) -> Result<(), ValidationError> {
        if base_id == self.id {
            return Err(ValidationError::SelfReference(self.id.clone()));
        }
        self.base_game_id = Some(base_id.to_string());
        Ok(())
    }

    /// Check the entity invariants before a write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if self.base_game_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::SelfReference(self.id.clone()));
        }
        if let Some(rating) = self.average_rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err(ValidationError::RatingOutOfRange(rating));
            }
        }
        if let Some(weight) = self.average_weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ValidationError::InvalidWeight(weight));
            }
        }
        if let (Some(min), Some(max)) = (self.min_players, self.max_players) {
            if min > max {
                return Err(ValidationError::PlayerRange { min, max });
            }
        }
        Ok(())
    }

    fn copy_entry_fields(&mut self, entry: &CatalogEntry) {
        self.name = entry.name.clone();
        self.description = entry.description.clone();
        self.image_url = entry.image_url.clone();
        self.rank = entry.rank;
        self.average_rating = entry.average_rating;
        self.average_weight = entry.average_weight;
        self.year_published = entry.year_published;
        self.min_players = entry.min_players;
        self.max_players = entry.max_players;
        self.supports_solo = entry.supports_solo();
        self.categories = entry.categories.iter().cloned().collect();
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Normalize a game name for lookups: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Generate a fresh local game id.
pub fn new_game_id() -> String {
    format!(
        "{}{}",
        GAME_ID_PREFIX,
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

/// Current UTC time in SQLite's `datetime('now')` format.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
