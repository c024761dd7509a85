//! Fixed-priority search across photo providers
//!
//! Providers are tried in order. A provider that errors on every query or
//! returns nothing usable hands over to the next one.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::search_provider::{rank_candidates, QualityThresholds, SearchProvider};
use crate::types::ImageCandidate;

/// Ranked candidates from the first provider that produced any
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub provider: &'static str,
    pub thresholds: QualityThresholds,
    pub candidates: Vec<ImageCandidate>,
}

pub struct SearchChain {
    providers: Vec<Arc<dyn SearchProvider>>,
    top_n: usize,
}

impl SearchChain {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, top_n: usize) -> Self {
        Self {
            providers,
            top_n: top_n.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run every query against each provider in turn
    ///
    /// Candidates from all queries of one provider are concatenated, then
    /// deduplicated and ranked. Returns `None` when every provider comes up
    /// empty.
    pub async fn search(&self, queries: &[String]) -> Option<SearchOutcome> {
        for provider in &self.providers {
            let name = provider.name();
            let mut collected = Vec::new();

            for query in queries {
                match provider.search(query).await {
                    Ok(candidates) => {
                        debug!(provider = name, query = %query, found = candidates.len(), "Query complete");
                        collected.extend(candidates);
                    }
                    Err(e) => {
                        warn!(provider = name, query = %query, error = %e, "Search query failed");
                    }
                }
            }

            let ranked = rank_candidates(collected, self.top_n);
            if ranked.is_empty() {
                info!(provider = name, "No usable candidates, trying next provider");
                continue;
            }

            info!(provider = name, candidates = ranked.len(), "Search provider produced candidates");
            return Some(SearchOutcome {
                provider: name,
                thresholds: provider.thresholds(),
                candidates: ranked,
            });
        }

        None
    }
}
