//! Pexels photo-search client
//!
//! Last provider in the search chain. Pexels exposes no popularity
//! counters, so only pixel size is filtered.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::rate_limiter::RateLimiter;
use super::search_provider::{status_error, ProviderError, QualityThresholds, SearchProvider};
use crate::types::ImageCandidate;

const USER_AGENT: &str = "vocab-images/0.1.0";
const PER_PAGE: u32 = 10;

pub const PEXELS_THRESHOLDS: QualityThresholds = QualityThresholds {
    min_downloads: 0,
    min_likes: 0,
    min_width: 800,
    min_height: 600,
};

#[derive(Debug, Deserialize)]
pub struct PexelsSearchResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
pub struct PexelsPhoto {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub alt: Option<String>,
    pub src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
pub struct PexelsSrc {
    pub large: String,
    pub medium: String,
}

impl From<PexelsPhoto> for ImageCandidate {
    fn from(photo: PexelsPhoto) -> Self {
        ImageCandidate {
            url: photo.src.large,
            thumbnail_url: photo.src.medium,
            provider: "pexels",
            downloads: 0,
            likes: 0,
            width: photo.width,
            height: photo.height,
            description: photo.alt.unwrap_or_default(),
        }
    }
}

/// Pexels API client
pub struct PexelsClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
    api_key: String,
}

impl PexelsClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        timeout: Duration,
        query_delay_ms: u64,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(query_delay_ms),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for PexelsClient {
    fn name(&self) -> &'static str {
        "pexels"
    }

    fn thresholds(&self) -> QualityThresholds {
        PEXELS_THRESHOLDS
    }

    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/search", self.base_url);
        tracing::debug!(provider = "pexels", query = %query, "Querying Pexels API");

        let per_page = PER_PAGE.to_string();
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: PexelsSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let raw_count = body.photos.len();
        let candidates =
            PEXELS_THRESHOLDS.filter(body.photos.into_iter().map(ImageCandidate::from).collect());

        tracing::debug!(
            provider = "pexels",
            query = %query,
            total_results = body.total_results,
            returned = raw_count,
            kept = candidates.len(),
            "Pexels search complete"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body: PexelsSearchResponse = serde_json::from_str(
            r#"{
                "total_results": 1,
                "page": 1,
                "per_page": 10,
                "photos": [
                    {
                        "id": 45201,
                        "width": 5184,
                        "height": 3456,
                        "url": "https://www.pexels.com/photo/45201/",
                        "alt": "Kitten lying on a blanket",
                        "src": {
                            "original": "https://images.pexels.com/original.jpeg",
                            "large": "https://images.pexels.com/large.jpeg",
                            "medium": "https://images.pexels.com/medium.jpeg",
                            "small": "https://images.pexels.com/small.jpeg"
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        let candidates: Vec<ImageCandidate> =
            body.photos.into_iter().map(ImageCandidate::from).collect();
        let kept = PEXELS_THRESHOLDS.filter(candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://images.pexels.com/large.jpeg");
        assert_eq!(kept[0].provider, "pexels");
        assert_eq!(kept[0].likes, 0);
    }
}
