//! The catalog lookups the reconciler depends on.

use meeple_bgg::{BggClient, Transport};
use meeple_catalog::{CatalogEntry, ExternalId};

/// A read-only external game catalog.
///
/// Implementations absorb their own failures: a lookup that cannot be
/// answered returns `None` or an empty list.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn search_by_name(&self, name: &str) -> Option<CatalogEntry>;

    async fn fetch_by_id(&self, id: ExternalId) -> Option<CatalogEntry>;

    async fn fetch_many_by_ids(&self, ids: &[ExternalId]) -> Vec<CatalogEntry>;

    async fn fetch_hot_list(&self) -> Vec<CatalogEntry>;
}

impl<T: Transport> CatalogSource for BggClient<T> {
    async fn search_by_name(&self, name: &str) -> Option<CatalogEntry> {
        BggClient::search_by_name(self, name).await
    }

    async fn fetch_by_id(&self, id: ExternalId) -> Option<CatalogEntry> {
        BggClient::fetch_by_id(self, id).await
    }

    async fn fetch_many_by_ids(&self, ids: &[ExternalId]) -> Vec<CatalogEntry> {
        BggClient::fetch_many_by_ids(self, ids).await
    }

    async fn fetch_hot_list(&self) -> Vec<CatalogEntry> {
        BggClient::fetch_hot_list(self).await
    }
}
