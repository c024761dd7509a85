//! Unsplash photo-search client
//!
//! First provider in the search chain. Search results report likes and
//! pixel size; download counts are not part of the search payload.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::rate_limiter::RateLimiter;
use super::search_provider::{status_error, ProviderError, QualityThresholds, SearchProvider};
use crate::types::ImageCandidate;

const USER_AGENT: &str = "vocab-images/0.1.0";
const PER_PAGE: u32 = 10;

pub const UNSPLASH_THRESHOLDS: QualityThresholds = QualityThresholds {
    min_downloads: 0,
    min_likes: 10,
    min_width: 800,
    min_height: 600,
};

#[derive(Debug, Deserialize)]
pub struct UnsplashSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub likes: u64,
    /// Present on photo detail payloads only
    #[serde(default)]
    pub downloads: Option<u64>,
    pub description: Option<String>,
    pub alt_description: Option<String>,
    pub urls: UnsplashUrls,
}

#[derive(Debug, Deserialize)]
pub struct UnsplashUrls {
    pub regular: String,
    pub small: String,
}

impl From<UnsplashPhoto> for ImageCandidate {
    fn from(photo: UnsplashPhoto) -> Self {
        ImageCandidate {
            url: photo.urls.regular,
            thumbnail_url: photo.urls.small,
            provider: "unsplash",
            downloads: photo.downloads.unwrap_or(0),
            likes: photo.likes,
            width: photo.width,
            height: photo.height,
            description: photo
                .description
                .or(photo.alt_description)
                .unwrap_or_default(),
        }
    }
}

/// Unsplash API client
pub struct UnsplashClient {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    base_url: String,
    access_key: String,
}

impl UnsplashClient {
    pub fn new(
        access_key: String,
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
            access_key,
        })
    }
}

#[async_trait]
impl SearchProvider for UnsplashClient {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    fn thresholds(&self) -> QualityThresholds {
        UNSPLASH_THRESHOLDS
    }

    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/search/photos", self.base_url);
        tracing::debug!(provider = "unsplash", query = %query, "Querying Unsplash API");

        let per_page = PER_PAGE.to_string();
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("content_filter", "high"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: UnsplashSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let raw_count = body.results.len();
        let candidates = UNSPLASH_THRESHOLDS
            .filter(body.results.into_iter().map(ImageCandidate::from).collect());

        tracing::debug!(
            provider = "unsplash",
            query = %query,
            total = body.total,
            returned = raw_count,
            kept = candidates.len(),
            "Unsplash search complete"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = UnsplashClient::new(
            "key".to_string(),
            "https://api.unsplash.com/",
            Duration::from_secs(5),
            0,
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.unsplash.com");
        assert_eq!(client.name(), "unsplash");
    }

    #[test]
    fn test_parse_search_response() {
        let body: UnsplashSearchResponse = serde_json::from_str(
            r#"{
                "total": 2,
                "total_pages": 1,
                "results": [
                    {
                        "id": "abc",
                        "width": 4000,
                        "height": 3000,
                        "likes": 120,
                        "description": null,
                        "alt_description": "orange cat on sofa",
                        "urls": {
                            "raw": "https://images.unsplash.com/raw",
                            "regular": "https://images.unsplash.com/regular",
                            "small": "https://images.unsplash.com/small",
                            "thumb": "https://images.unsplash.com/thumb"
                        }
                    },
                    {
                        "id": "def",
                        "width": 640,
                        "height": 480,
                        "likes": 3,
                        "description": "tiny",
                        "urls": { "regular": "https://r2", "small": "https://s2" }
                    }
                ]
            }"#,
        )
        .unwrap();

        let candidates: Vec<ImageCandidate> =
            body.results.into_iter().map(ImageCandidate::from).collect();
        assert_eq!(candidates[0].url, "https://images.unsplash.com/regular");
        assert_eq!(candidates[0].description, "orange cat on sofa");
        assert_eq!(candidates[0].downloads, 0);

        let kept = UNSPLASH_THRESHOLDS.filter(candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].likes, 120);
    }
}
