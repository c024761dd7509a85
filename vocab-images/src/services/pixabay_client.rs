//! Pixabay photo-search client
//!
//! Second provider in the search chain. Pixabay reports downloads, likes
//! and full pixel size, so it carries the strictest popularity filter.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::rate_limiter::RateLimiter;
use super::search_provider::{status_error, ProviderError, QualityThresholds, SearchProvider};
use crate::types::ImageCandidate;

const USER_AGENT: &str = "vocab-images/0.1.0";
const PER_PAGE: u32 = 10;

pub const PIXABAY_THRESHOLDS: QualityThresholds = QualityThresholds {
    min_downloads: 500,
    min_likes: 20,
    min_width: 800,
    min_height: 600,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixabaySearchResponse {
    #[serde(default)]
    pub total_hits: u64,
    #[serde(default)]
    pub hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixabayHit {
    pub id: u64,
    #[serde(default)]
    pub tags: String,
    #[serde(rename = "webformatURL")]
    pub webformat_url: String,
    #[serde(rename = "largeImageURL")]
    pub large_image_url: Option<String>,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub likes: u64,
}

impl From<PixabayHit> for ImageCandidate {
    fn from(hit: PixabayHit) -> Self {
        ImageCandidate {
            url: hit.large_image_url.unwrap_or_else(|| hit.webformat_url.clone()),
            thumbnail_url: hit.webformat_url,
            provider: "pixabay",
            downloads: hit.downloads,
            likes: hit.likes,
            width: hit.image_width,
            height: hit.image_height,
            description: hit.tags,
        }
    }
}

/// Pixabay API client
pub struct PixabayClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
    api_key: String,
}

impl PixabayClient {
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
impl SearchProvider for PixabayClient {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    fn thresholds(&self) -> QualityThresholds {
        PIXABAY_THRESHOLDS
    }

    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/api/", self.base_url);
        tracing::debug!(provider = "pixabay", query = %query, "Querying Pixabay API");

        let per_page = PER_PAGE.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("image_type", "photo"),
                ("safesearch", "true"),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: PixabaySearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let raw_count = body.hits.len();
        let candidates =
            PIXABAY_THRESHOLDS.filter(body.hits.into_iter().map(ImageCandidate::from).collect());

        tracing::debug!(
            provider = "pixabay",
            query = %query,
            total_hits = body.total_hits,
            returned = raw_count,
            kept = candidates.len(),
            "Pixabay search complete"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body: PixabaySearchResponse = serde_json::from_str(
            r#"{
                "total": 500,
                "totalHits": 2,
                "hits": [
                    {
                        "id": 195893,
                        "pageURL": "https://pixabay.com/en/cat-195893/",
                        "tags": "cat, pet, animal",
                        "previewURL": "https://cdn.pixabay.com/preview.jpg",
                        "webformatURL": "https://pixabay.com/get/web.jpg",
                        "largeImageURL": "https://pixabay.com/get/large.jpg",
                        "imageWidth": 4000,
                        "imageHeight": 2250,
                        "downloads": 12000,
                        "likes": 310
                    },
                    {
                        "id": 2,
                        "tags": "cat",
                        "webformatURL": "https://pixabay.com/get/web2.jpg",
                        "imageWidth": 1920,
                        "imageHeight": 1080,
                        "downloads": 40,
                        "likes": 1
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(body.total_hits, 2);
        let candidates: Vec<ImageCandidate> =
            body.hits.into_iter().map(ImageCandidate::from).collect();
        assert_eq!(candidates[0].url, "https://pixabay.com/get/large.jpg");
        assert_eq!(candidates[0].thumbnail_url, "https://pixabay.com/get/web.jpg");
        assert_eq!(candidates[1].url, "https://pixabay.com/get/web2.jpg");

        let kept = PIXABAY_THRESHOLDS.filter(candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].downloads, 12000);
        assert_eq!(kept[0].description, "cat, pet, animal");
    }
}
