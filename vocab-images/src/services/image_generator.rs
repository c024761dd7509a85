//! Purpose-built illustrations from an image-generation model
//!
//! One attempt per request. A failed call is final for that request and the
//! pipeline moves on to search.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::openai_client::{OpenAiClient, OpenAiError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    OpenAi(#[from] OpenAiError),

    #[error("Response contained no image URL")]
    NoImage,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generator label used in logs and result reasoning
    fn name(&self) -> &'static str;

    /// Generate one image, returning its URL
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Image generation via the OpenAI `images/generations` endpoint
pub struct OpenAiImageGenerator {
    client: OpenAiClient,
    model: String,
    size: String,
}

impl OpenAiImageGenerator {
    pub fn new(client: OpenAiClient, model: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            size: size.into(),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
        })
    }
}

/// Pull `data[0].url` out of a generation response
pub fn extract_image_url(response: &Value) -> Option<String> {
    response
        .get("data")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .filter(|u| !u.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    fn name(&self) -> &'static str {
        "openai-images"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.model, size = %self.size, "Requesting generated image");

        let response = self
            .client
            .post_json("images/generations", &self.request_body(prompt))
            .await?;

        let url = extract_image_url(&response).ok_or(GenerationError::NoImage)?;
        tracing::info!(model = %self.model, "Image generated");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_extract_image_url() {
        let response = json!({
            "created": 1700000000,
            "data": [{ "url": "https://oaidalle.example/img.png", "revised_prompt": "..." }]
        });
        assert_eq!(
            extract_image_url(&response).as_deref(),
            Some("https://oaidalle.example/img.png")
        );
    }

    #[test]
    fn test_extract_image_url_missing() {
        assert!(extract_image_url(&json!({ "data": [] })).is_none());
        assert!(extract_image_url(&json!({ "data": [{ "b64_json": "AAAA" }] })).is_none());
        assert!(extract_image_url(&json!({ "error": "nope" })).is_none());
    }

    #[test]
    fn test_request_body() {
        let client =
            OpenAiClient::new("k".to_string(), "https://api.openai.com/v1", Duration::from_secs(5))
                .unwrap();
        let generator = OpenAiImageGenerator::new(client, "dall-e-3", "1024x1024");
        let body = generator.request_body("a cat");
        assert_eq!(body["model"], "dall-e-3");
        assert_eq!(body["n"], 1);
        assert_eq!(body["prompt"], "a cat");
    }
}
