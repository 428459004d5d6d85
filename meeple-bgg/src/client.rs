use std::collections::HashMap;

use meeple_catalog::{CatalogEntry, ExternalId, Suggestion};

use crate::config::BggConfig;
use crate::derive::best_match;
use crate::error::BggError;
use crate::retry::{RetryPolicy, send_with_retry};
use crate::transport::{HttpTransport, Transport};
use crate::xml::{self, SearchHit};

/// Item types requested from the search endpoint.
const SEARCH_TYPES: &str = "boardgame,boardgameexpansion";

/// Client for the BoardGameGeek XML API2.
///
/// Every public lookup is best effort: network, rate-limit and parse
/// failures are logged and turned into `None` or an empty list.
pub struct BggClient<T: Transport = HttpTransport> {
    transport: T,
    config: BggConfig,
    policy: RetryPolicy,
}

impl BggClient<HttpTransport> {
    /// Create a client that talks HTTP to `config.base_url`.
    pub fn new(config: BggConfig) -> Result<Self, BggError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> BggClient<T> {
    pub fn with_transport(transport: T, config: BggConfig) -> Self {
        let policy = config.retry_policy();
        Self {
            transport,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &BggConfig {
        &self.config
    }

    /// Search by name and return the single best-matching candidate.
    ///
    /// Each candidate is fetched in full, one request per candidate.
    pub async fn search_by_name(&self, name: &str) -> Option<CatalogEntry> {
        let candidates = self.fetch_candidates(name, false).await;
        let best = best_match(name, &candidates)?;
        log::debug!(
            "Best match for '{}' among {} candidates: '{}' ({})",
            name,
            candidates.len(),
            best.name,
            best.external_id
        );
        Some(best.clone())
    }

    /// Search by name and return every candidate in full.
    ///
    /// Detail fetches run one at a time with the configured pause between
    /// them.
    pub async fn search_many(&self, name: &str) -> Vec<CatalogEntry> {
        self.fetch_candidates(name, true).await
    }

    /// Fetch full detail for one game.
    pub async fn fetch_by_id(&self, id: ExternalId) -> Option<CatalogEntry> {
        match self.fetch_things(&[id]).await {
            Ok(items) => items.into_iter().find_map(|item| match item {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Could not read game {} from BoardGameGeek: {}", id, e);
                    None
                }
            }),
            Err(BggError::NotReady) => {
                log::info!("Game {} is not available yet, try again later", id);
                None
            }
            Err(e) => {
                log::warn!("Fetching game {} failed: {}", id, e);
                None
            }
        }
    }

    /// Fetch the trending list.
    pub async fn fetch_hot_list(&self) -> Vec<CatalogEntry> {
        let query = [("type", "boardgame".to_string())];
        let result = match self.get("hot", &query).await {
            Ok(body) => xml::parse_hot(&body),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            log::warn!("Fetching the hot list failed: {}", e);
            Vec::new()
        })
    }

    /// Fetch full detail for many games using batched requests.
    ///
    /// Items that fail to parse are dropped; a failed batch drops only the
    /// ids in that batch.
    pub async fn fetch_many_by_ids(&self, ids: &[ExternalId]) -> Vec<CatalogEntry> {
        let mut entries = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.config.batch_size.max(1)) {
            match self.fetch_things(chunk).await {
                Ok(items) => {
                    for item in items {
                        match item {
                            Ok(entry) => entries.push(entry),
                            Err(e) => log::warn!("Dropping unreadable item: {}", e),
                        }
                    }
                }
                Err(e) => log::warn!("Batch of {} games failed: {}", chunk.len(), e),
            }
        }
        entries
    }

    /// One page of lightweight search results.
    ///
    /// Only the requested page is fetched in detail, in a single batch, to
    /// fill in images and expansion flags.
    pub async fn search_suggestions(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Vec<Suggestion> {
        let hits = match self.search_hits(query).await {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                return Vec::new();
            }
        };
        let page: Vec<SearchHit> = hits.into_iter().skip(offset).take(limit).collect();
        if page.is_empty() {
            return Vec::new();
        }

        let ids: Vec<ExternalId> = page.iter().map(|h| h.external_id).collect();
        let details: HashMap<ExternalId, CatalogEntry> = self
            .fetch_many_by_ids(&ids)
            .await
            .into_iter()
            .map(|e| (e.external_id, e))
            .collect();

        page.into_iter()
            .map(|hit| {
                let detail = details.get(&hit.external_id);
                Suggestion {
                    external_id: hit.external_id,
                    is_expansion: hit.is_expansion() || detail.is_some_and(|d| d.is_expansion),
                    image_url: detail.and_then(|d| d.image_url.clone()),
                    year_published: hit
                        .year_published
                        .or_else(|| detail.and_then(|d| d.year_published)),
                    name: hit.name,
                }
            })
            .collect()
    }

    /// Search, then fetch each candidate individually.
    async fn fetch_candidates(&self, name: &str, pause_between: bool) -> Vec<CatalogEntry> {
        let mut hits = match self.search_hits(name).await {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", name, e);
                return Vec::new();
            }
        };
        if let Some(cap) = self.config.max_candidates {
            hits.truncate(cap);
        }
        log::debug!("Search for '{}' returned {} candidates", name, hits.len());

        let mut entries = Vec::with_capacity(hits.len());
        for (i, hit) in hits.iter().enumerate() {
            if pause_between && i > 0 {
                tokio::time::sleep(self.config.candidate_delay()).await;
            }
            if let Some(entry) = self.fetch_by_id(hit.external_id).await {
                entries.push(entry);
            }
        }
        entries
    }

    async fn search_hits(&self, query: &str) -> Result<Vec<SearchHit>, BggError> {
        let params = [
            ("query", query.trim().to_string()),
            ("type", SEARCH_TYPES.to_string()),
        ];
        let body = self.get("search", &params).await?;
        let mut hits = xml::parse_search(&body)?;

        // An id can be listed once per item type.
        let mut seen = std::collections::HashSet::new();
        hits.retain(|h| seen.insert(h.external_id));
        Ok(hits)
    }

    async fn fetch_things(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Result<CatalogEntry, BggError>>, BggError> {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let params = [("id", id_list), ("stats", "1".to_string())];
        let body = self.get("thing", &params).await?;
        xml::parse_things(&body)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, BggError> {
        send_with_retry(&self.transport, &self.policy, path, query).await
    }
}
