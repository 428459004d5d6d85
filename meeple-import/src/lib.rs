//! Reconcile requested games between the local store and the catalog.
//!
//! [`Reconciler`] implements get-or-import by name or external id, base game
//! linking for expansions, and catalog refresh. It is generic over the
//! storage backend ([`meeple_catalog::CatalogStore`]) and the catalog
//! ([`CatalogSource`], implemented for [`meeple_bgg::BggClient`]).

pub mod batch;
pub mod error;
pub mod progress;
pub mod reconciler;
pub mod source;

pub use batch::{HotListStats, RefreshStats};
pub use error::ReconcileError;
pub use progress::{ImportProgress, LogProgress, SilentProgress};
pub use reconciler::Reconciler;
pub use source::CatalogSource;
