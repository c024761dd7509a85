//! Pipeline assembly from bootstrap configuration
//!
//! Each external component is built only when its API key resolves
//! (environment → TOML). A missing key is not an error: the component is
//! left out and its tier is skipped.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use vocab_common::config::{ApiKeyKind, TomlConfig};
use vocab_common::{Error, Result};

use crate::catalog::ImageCatalog;
use crate::services::{
    ImageCache, ImagePipeline, OpenAiClient, OpenAiImageGenerator, OpenAiVisionEvaluator,
    PexelsClient, PixabayClient, SearchChain, SearchProvider, UnsplashClient,
};

/// Search providers in priority order, skipping those without a key
pub fn build_search_providers(config: &TomlConfig) -> Result<Vec<Arc<dyn SearchProvider>>> {
    let settings = &config.providers;
    let timeout = Duration::from_secs(settings.timeout_secs);
    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

    if let Some(resolved) = config.resolve_api_key(ApiKeyKind::Unsplash) {
        let client = UnsplashClient::new(
            resolved.key,
            &settings.unsplash_base_url,
            timeout,
            settings.query_delay_ms,
        )
        .map_err(|e| Error::Internal(format!("Unsplash client: {}", e)))?;
        providers.push(Arc::new(client));
    }

    if let Some(resolved) = config.resolve_api_key(ApiKeyKind::Pixabay) {
        let client = PixabayClient::new(
            resolved.key,
            &settings.pixabay_base_url,
            timeout,
            settings.query_delay_ms,
        )
        .map_err(|e| Error::Internal(format!("Pixabay client: {}", e)))?;
        providers.push(Arc::new(client));
    }

    if let Some(resolved) = config.resolve_api_key(ApiKeyKind::Pexels) {
        let client = PexelsClient::new(
            resolved.key,
            &settings.pexels_base_url,
            timeout,
            settings.query_delay_ms,
        )
        .map_err(|e| Error::Internal(format!("Pexels client: {}", e)))?;
        providers.push(Arc::new(client));
    }

    Ok(providers)
}

/// Build the full pipeline around a shared cache
pub fn build_pipeline(config: &TomlConfig, cache: Arc<ImageCache>) -> Result<ImagePipeline> {
    let catalog = Arc::new(ImageCatalog::load(config.catalog_path.as_deref())?);
    let timeout = Duration::from_secs(config.providers.timeout_secs);

    let providers = build_search_providers(config)?;
    let mut builder = ImagePipeline::builder(catalog, cache)
        .search_chain(SearchChain::new(providers, config.providers.top_n))
        .min_confidence(config.thresholds.min_confidence);

    if let Some(resolved) = config.resolve_api_key(ApiKeyKind::OpenAi) {
        let openai = |key: String| {
            OpenAiClient::new(key, &config.providers.openai_base_url, timeout)
                .map_err(|e| Error::Internal(format!("OpenAI client: {}", e)))
        };

        builder = builder
            .generator(Arc::new(OpenAiImageGenerator::new(
                openai(resolved.key.clone())?,
                config.models.image_model.clone(),
                config.models.image_size.clone(),
            )))
            .evaluator(Arc::new(OpenAiVisionEvaluator::new(
                openai(resolved.key)?,
                config.models.vision_model.clone(),
            )));
    }

    let pipeline = builder.build();
    let status = pipeline.status();
    info!(
        strategies = ?status.strategies,
        providers = ?status.providers,
        evaluation_enabled = status.evaluation_enabled,
        "Image pipeline assembled"
    );

    Ok(pipeline)
}
