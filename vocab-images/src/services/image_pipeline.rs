//! Image resolution pipeline
//!
//! `find_best_image` walks a fixed list of tiers and returns the first
//! answer:
//!
//! 1. Cache hit, returned verbatim
//! 2. [`GenerationStrategy`]: purpose-built illustration
//! 3. [`SearchStrategy`]: provider search + LLM ranking behind a confidence gate
//! 4. Curated fallback from the catalog, which always answers
//!
//! Every failure (transport, unreadable LLM output, semantic rejection, no
//! candidates) just moves to the next tier. Tiers whose credentials are
//! missing are never built.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::image_cache::{CacheEntry, ImageCache};
use super::image_generator::ImageGenerator;
use super::search_chain::SearchChain;
use super::semantic_evaluator::{RankingVerdict, SemanticEvaluator};
use crate::catalog::ImageCatalog;
use crate::types::{
    CategoryItemValidation, ImageCandidate, ImageSearchResult, ImageValidation, WordRequest,
};

/// Confidence reported for generated images
pub const GENERATED_CONFIDENCE: f32 = 0.95;
/// Confidence reported for a per-word curated image
pub const CURATED_WORD_CONFIDENCE: f32 = 0.95;
/// Confidence reported for a category or global default image
pub const CURATED_DEFAULT_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Image evaluation is not configured. Set VOCAB_OPENAI_API_KEY or [api_keys] openai in the TOML config.")]
    EvaluatorUnavailable,
}

/// One tier of the pipeline
#[async_trait]
pub trait ImageStrategy: Send + Sync {
    /// Tier label, also recorded as the cache entry source
    fn name(&self) -> &'static str;

    /// Try to produce an image; `None` hands over to the next tier
    async fn attempt(&self, request: &WordRequest) -> Option<ImageSearchResult>;
}

/// Generation tier
pub struct GenerationStrategy {
    generator: Arc<dyn ImageGenerator>,
    catalog: Arc<ImageCatalog>,
}

impl GenerationStrategy {
    pub fn new(generator: Arc<dyn ImageGenerator>, catalog: Arc<ImageCatalog>) -> Self {
        Self { generator, catalog }
    }
}

#[async_trait]
impl ImageStrategy for GenerationStrategy {
    fn name(&self) -> &'static str {
        "generated"
    }

    async fn attempt(&self, request: &WordRequest) -> Option<ImageSearchResult> {
        let prompt = self.catalog.prompt_for(request);

        match self.generator.generate(&prompt).await {
            Ok(url) => Some(ImageSearchResult::new(
                url,
                GENERATED_CONFIDENCE,
                format!(
                    "Purpose-built illustration of '{}' ({}) generated by {}",
                    request.word,
                    request.translation,
                    self.generator.name()
                ),
                true,
            )),
            Err(e) => {
                warn!(word = %request.word, generator = self.generator.name(), error = %e, "Image generation failed");
                None
            }
        }
    }
}

/// A search candidate that passed the acceptance gate
#[derive(Debug, Clone)]
pub struct AcceptedImage {
    pub provider: &'static str,
    pub candidate: ImageCandidate,
    pub verdict: RankingVerdict,
}

/// Search + ranking tier
pub struct SearchStrategy {
    chain: SearchChain,
    evaluator: Arc<dyn SemanticEvaluator>,
    catalog: Arc<ImageCatalog>,
    min_confidence: f32,
}

impl SearchStrategy {
    pub fn new(
        chain: SearchChain,
        evaluator: Arc<dyn SemanticEvaluator>,
        catalog: Arc<ImageCatalog>,
        min_confidence: f32,
    ) -> Self {
        Self {
            chain,
            evaluator,
            catalog,
            min_confidence,
        }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.chain.provider_names()
    }

    /// Search, rank, and apply the acceptance gate
    pub async fn find_accepted(&self, request: &WordRequest) -> Option<AcceptedImage> {
        let queries = self.catalog.queries_for(request);
        let Some(outcome) = self.chain.search(&queries).await else {
            info!(word = %request.word, "No provider returned candidates");
            return None;
        };

        let rule = self.catalog.rule_for(&request.word);
        let verdict = self.evaluator.rank(request, rule, &outcome.candidates).await;

        let Some(index) = verdict.best_index else {
            info!(word = %request.word, reasoning = %verdict.reasoning, "Evaluator picked no candidate");
            return None;
        };
        let Some(candidate) = outcome.candidates.get(index).cloned() else {
            info!(
                word = %request.word,
                index,
                candidates = outcome.candidates.len(),
                "Evaluator picked an index outside the candidate list"
            );
            return None;
        };

        if verdict.confidence < self.min_confidence {
            info!(
                word = %request.word,
                confidence = verdict.confidence,
                min_confidence = self.min_confidence,
                "Ranked candidate below confidence threshold"
            );
            return None;
        }
        if !verdict.is_correct || !verdict.child_friendly {
            info!(
                word = %request.word,
                is_correct = verdict.is_correct,
                child_friendly = verdict.child_friendly,
                reasoning = %verdict.reasoning,
                "Ranked candidate failed semantic check"
            );
            return None;
        }
        if !outcome.thresholds.accepts(&candidate) {
            info!(word = %request.word, provider = outcome.provider, "Ranked candidate below quality thresholds");
            return None;
        }

        Some(AcceptedImage {
            provider: outcome.provider,
            candidate,
            verdict,
        })
    }
}

#[async_trait]
impl ImageStrategy for SearchStrategy {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn attempt(&self, request: &WordRequest) -> Option<ImageSearchResult> {
        let accepted = self.find_accepted(request).await?;
        Some(ImageSearchResult::new(
            accepted.candidate.url,
            accepted.verdict.confidence,
            format!("{} (via {})", accepted.verdict.reasoning, accepted.provider),
            true,
        ))
    }
}

/// Which tiers are live, for health reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    pub strategies: Vec<&'static str>,
    pub providers: Vec<&'static str>,
    pub evaluation_enabled: bool,
}

pub struct ImagePipeline {
    cache: Arc<ImageCache>,
    catalog: Arc<ImageCatalog>,
    strategies: Vec<Arc<dyn ImageStrategy>>,
    search: Option<Arc<SearchStrategy>>,
    evaluator: Option<Arc<dyn SemanticEvaluator>>,
}

impl ImagePipeline {
    pub fn builder(catalog: Arc<ImageCatalog>, cache: Arc<ImageCache>) -> ImagePipelineBuilder {
        ImagePipelineBuilder {
            catalog,
            cache,
            generator: None,
            chain: None,
            evaluator: None,
            min_confidence: 0.9,
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            strategies: self.strategies.iter().map(|s| s.name()).collect(),
            providers: self
                .search
                .as_ref()
                .map(|s| s.provider_names())
                .unwrap_or_default(),
            evaluation_enabled: self.evaluator.is_some(),
        }
    }

    /// Curated fallback as a pipeline result
    ///
    /// Per-word picks are reported as checked, category defaults are not.
    pub fn curated_result(&self, request: &WordRequest) -> ImageSearchResult {
        let curated = self.catalog.curated_fallback(&request.word, &request.category);
        if curated.per_word {
            ImageSearchResult::new(
                curated.url,
                CURATED_WORD_CONFIDENCE,
                format!("Hand-picked image for '{}'", request.word),
                true,
            )
        } else {
            ImageSearchResult::new(
                curated.url,
                CURATED_DEFAULT_CONFIDENCE,
                format!(
                    "No verified image for '{}'; using the curated '{}' default",
                    request.word, request.category
                ),
                false,
            )
        }
    }

    /// Resolve one image for a word; always answers
    pub async fn find_best_image(&self, request: &WordRequest) -> ImageSearchResult {
        if let Some(entry) = self.cache.lookup(&request.word).await {
            debug!(word = %request.word, source = %entry.source, "Cache hit");
            return entry.to_result();
        }

        for strategy in &self.strategies {
            if let Some(result) = strategy.attempt(request).await {
                info!(
                    word = %request.word,
                    strategy = strategy.name(),
                    confidence = result.confidence,
                    "Image resolved"
                );
                self.cache
                    .store(&request.word, CacheEntry::from_result(&result, strategy.name()))
                    .await;
                return result;
            }
            debug!(word = %request.word, strategy = strategy.name(), "Strategy produced nothing");
        }

        info!(word = %request.word, category = %request.category, "Using curated fallback");
        self.curated_result(request)
    }

    /// Search-only replacement image, accepted by the evaluator
    pub async fn find_better_image(&self, request: &WordRequest) -> Option<(String, ImageValidation)> {
        let search = self.search.as_ref()?;
        let accepted = search.find_accepted(request).await?;

        let validation = ImageValidation {
            is_valid: true,
            confidence: accepted.verdict.confidence,
            reasoning: accepted.verdict.reasoning,
            child_friendly: accepted.verdict.child_friendly,
            suggested_replacement: None,
        };
        Some((accepted.candidate.url, validation))
    }

    /// Judge an image; on rejection, suggest a replacement
    ///
    /// The replacement is a search result when one passes the gate, else the
    /// curated image unless that is the very image being rejected.
    pub async fn validate_image(
        &self,
        request: &WordRequest,
        image_url: &str,
    ) -> Result<ImageValidation, PipelineError> {
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or(PipelineError::EvaluatorUnavailable)?;

        let rule = self.catalog.rule_for(&request.word);
        let mut validation = evaluator.judge(request, rule, image_url).await;

        if !validation.is_valid {
            info!(word = %request.word, reasoning = %validation.reasoning, "Image rejected, looking for replacement");
            let replacement = match self.find_better_image(request).await {
                Some((url, _)) => Some(url),
                None => {
                    let curated = self.catalog.curated_fallback(&request.word, &request.category);
                    (curated.url != image_url).then_some(curated.url)
                }
            };
            validation.suggested_replacement = replacement;
        }

        Ok(validation)
    }

    /// Validate every item of a category, one after another
    pub async fn validate_category(
        &self,
        items: &[(WordRequest, String)],
    ) -> Result<Vec<CategoryItemValidation>, PipelineError> {
        if self.evaluator.is_none() {
            return Err(PipelineError::EvaluatorUnavailable);
        }

        let mut results = Vec::with_capacity(items.len());
        for (request, image_url) in items {
            let validation = self.validate_image(request, image_url).await?;
            results.push(CategoryItemValidation {
                word: request.word.clone(),
                replacement_url: validation.suggested_replacement.clone(),
                validation,
            });
        }
        Ok(results)
    }
}

pub struct ImagePipelineBuilder {
    catalog: Arc<ImageCatalog>,
    cache: Arc<ImageCache>,
    generator: Option<Arc<dyn ImageGenerator>>,
    chain: Option<SearchChain>,
    evaluator: Option<Arc<dyn SemanticEvaluator>>,
    min_confidence: f32,
}

impl ImagePipelineBuilder {
    pub fn generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn search_chain(mut self, chain: SearchChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn SemanticEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn build(self) -> ImagePipeline {
        let mut strategies: Vec<Arc<dyn ImageStrategy>> = Vec::new();

        if let Some(generator) = self.generator {
            strategies.push(Arc::new(GenerationStrategy::new(generator, self.catalog.clone())));
        }

        let search = match (self.chain, self.evaluator.clone()) {
            (Some(chain), Some(evaluator)) if !chain.is_empty() => Some(Arc::new(SearchStrategy::new(
                chain,
                evaluator,
                self.catalog.clone(),
                self.min_confidence,
            ))),
            (Some(chain), None) if !chain.is_empty() => {
                warn!("Search providers configured without an evaluator; search tier disabled");
                None
            }
            _ => None,
        };
        if let Some(search) = &search {
            strategies.push(search.clone());
        }

        ImagePipeline {
            cache: self.cache,
            catalog: self.catalog,
            strategies,
            search,
            evaluator: self.evaluator,
        }
    }
}
