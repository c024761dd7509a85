//! In-process cache of resolved images
//!
//! Keyed by the trimmed, lowercased word. Entries live until the process
//! exits: no eviction, no TTL, no persistence. The vocabulary is small and
//! fixed, so unbounded growth is accepted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::types::ImageSearchResult;

/// One resolved image
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub url: String,
    pub confidence: f32,
    pub generated_at: DateTime<Utc>,
    /// Tier that produced the image ("generated" or "search")
    pub source: String,
    pub reasoning: String,
    pub logic_check: bool,
}

impl CacheEntry {
    pub fn from_result(result: &ImageSearchResult, source: impl Into<String>) -> Self {
        Self {
            url: result.best_image_url.clone(),
            confidence: result.confidence,
            generated_at: Utc::now(),
            source: source.into(),
            reasoning: result.reasoning.clone(),
            logic_check: result.logic_check,
        }
    }

    /// The response originally returned for this entry
    pub fn to_result(&self) -> ImageSearchResult {
        ImageSearchResult {
            best_image_url: self.url.clone(),
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
            logic_check: self.logic_check,
        }
    }
}

fn cache_key(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Word → image cache, shared across requests
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive exact match
    pub async fn lookup(&self, word: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(&cache_key(word)).cloned()
    }

    /// Unconditional overwrite
    pub async fn store(&self, word: &str, entry: CacheEntry) {
        self.entries.write().await.insert(cache_key(word), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> CacheEntry {
        CacheEntry::from_result(&ImageSearchResult::new(url, 0.95, "because", true), "generated")
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let cache = ImageCache::new();
        cache.store("Cat", entry("https://img/cat")).await;

        assert_eq!(cache.lookup("cat").await.unwrap().url, "https://img/cat");
        assert_eq!(cache.lookup(" CAT ").await.unwrap().url, "https://img/cat");
        assert!(cache.lookup("cats").await.is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let cache = ImageCache::new();
        cache.store("dog", entry("https://img/1")).await;
        cache.store("DOG", entry("https://img/2")).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.lookup("dog").await.unwrap().url, "https://img/2");
    }

    #[tokio::test]
    async fn test_entry_round_trips_result() {
        let result = ImageSearchResult::new("https://img/x", 0.91, "ranked first", true);
        let entry = CacheEntry::from_result(&result, "search");
        assert_eq!(entry.to_result(), result);
        assert_eq!(entry.source, "search");
    }

    #[tokio::test]
    async fn test_empty() {
        let cache = ImageCache::new();
        assert!(cache.is_empty().await);
        cache.store("sun", entry("https://img/sun")).await;
        assert!(!cache.is_empty().await);
    }
}
