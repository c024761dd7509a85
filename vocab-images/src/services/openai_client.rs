//! Thin OpenAI HTTP client shared by the generator and the evaluator

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "vocab-images/0.1.0";

/// OpenAI client errors
#[derive(Debug, Error)]
pub enum OpenAiError {
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

pub struct OpenAiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, OpenAiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// POST a JSON body to `{base_url}/{path}` and return the JSON response
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, OpenAiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| OpenAiError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(OpenAiError::InvalidApiKey);
        }

        if status == 429 {
            return Err(OpenAiError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OpenAiError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| OpenAiError::ParseError(e.to_string()))
    }
}
