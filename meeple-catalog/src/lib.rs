//! Board game catalog data model, validation, and the storage contract.
//!
//! This crate defines the entities shared by the catalog client, the SQLite
//! store, and the import logic without depending on any of them. Consumers
//! implement [`CatalogStore`] to plug a persistence backend into the importer.

pub mod error;
pub mod store;
pub mod types;

pub use error::{StoreError, ValidationError};
pub use store::CatalogStore;
pub use types::*;
