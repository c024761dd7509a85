//! Uniform contract for photo-search providers
//!
//! Every adapter turns one free-text query into a filtered, deduplicated
//! list of [`ImageCandidate`]s. Ranking across queries happens in
//! [`rank_candidates`].

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::types::ImageCandidate;

/// Score weight per download
pub const DOWNLOAD_WEIGHT: f64 = 1.0;
/// Score weight per like
pub const LIKE_WEIGHT: f64 = 5.0;
/// Pixel area is divided by this before being added to the score
pub const AREA_DIVISOR: f64 = 10_000.0;

/// Search provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Map a non-success status to a provider error
pub(crate) async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    match status.as_u16() {
        401 | 403 => ProviderError::InvalidApiKey,
        429 => ProviderError::RateLimitExceeded,
        code => {
            let error_text = response.text().await.unwrap_or_default();
            ProviderError::ApiError(code, error_text)
        }
    }
}

/// Minimum-quality thresholds applied by one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    pub min_downloads: u64,
    pub min_likes: u64,
    pub min_width: u32,
    pub min_height: u32,
}

impl QualityThresholds {
    pub fn accepts(&self, candidate: &ImageCandidate) -> bool {
        candidate.downloads >= self.min_downloads
            && candidate.likes >= self.min_likes
            && candidate.width >= self.min_width
            && candidate.height >= self.min_height
    }

    /// Keep accepted candidates, each URL once, in input order
    pub fn filter(&self, candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
        dedupe_by_url(candidates.into_iter().filter(|c| self.accepts(c)).collect())
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider label used in logs and candidate provenance
    fn name(&self) -> &'static str;

    /// Thresholds the provider filters with
    fn thresholds(&self) -> QualityThresholds;

    /// Run one query
    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ProviderError>;
}

/// Drop repeated URLs, keeping the first occurrence
pub fn dedupe_by_url(candidates: Vec<ImageCandidate>) -> Vec<ImageCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

/// Linear popularity/size score
pub fn score(candidate: &ImageCandidate) -> f64 {
    candidate.downloads as f64 * DOWNLOAD_WEIGHT
        + candidate.likes as f64 * LIKE_WEIGHT
        + candidate.area() as f64 / AREA_DIVISOR
}

/// Deduplicate, sort by descending score, keep the top `top_n`
///
/// Ties keep their original order.
pub fn rank_candidates(candidates: Vec<ImageCandidate>, top_n: usize) -> Vec<ImageCandidate> {
    let mut ranked = dedupe_by_url(candidates);
    ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
pub(crate) fn candidate(url: &str, downloads: u64, likes: u64, width: u32, height: u32) -> ImageCandidate {
    ImageCandidate {
        url: url.to_string(),
        thumbnail_url: format!("{}?thumb", url),
        provider: "test",
        downloads,
        likes,
        width,
        height,
        description: String::new(),
    }
}
