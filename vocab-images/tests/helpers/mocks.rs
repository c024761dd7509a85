//! Mock generator, search provider and evaluator
//!
//! Each mock counts its invocations so tests can assert that a tier was
//! (or was not) reached.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vocab_images::catalog::ImageCatalog;
use vocab_images::services::image_generator::GenerationError;
use vocab_images::services::{
    ImageCache, ImageGenerator, ImagePipeline, OpenAiError, ProviderError, QualityThresholds,
    RankingVerdict, SearchChain, SearchProvider, SemanticEvaluator,
};
use vocab_images::types::{ImageCandidate, ImageValidation, WordRequest};

pub fn candidate(url: &str, downloads: u64, likes: u64) -> ImageCandidate {
    ImageCandidate {
        url: url.to_string(),
        thumbnail_url: format!("{}?w=200", url),
        provider: "mock",
        downloads,
        likes,
        width: 1200,
        height: 900,
        description: String::new(),
    }
}

/// Generator returning a fixed URL, or failing
pub struct MockGenerator {
    url: Option<String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn succeeding(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: Some(url.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            url: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock-generator"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => Err(GenerationError::OpenAi(OpenAiError::ApiError(
                500,
                "generation unavailable".to_string(),
            ))),
        }
    }
}

/// Provider returning the same candidates for every query, or failing
pub struct MockProvider {
    name: &'static str,
    results: Vec<ImageCandidate>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn returning(name: &'static str, results: Vec<ImageCandidate>) -> Arc<Self> {
        Arc::new(Self {
            name,
            results,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn empty(name: &'static str) -> Arc<Self> {
        Self::returning(name, Vec::new())
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            results: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            min_downloads: 100,
            min_likes: 10,
            min_width: 800,
            min_height: 600,
        }
    }

    async fn search(&self, _query: &str) -> Result<Vec<ImageCandidate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::NetworkError("connection refused".to_string()));
        }
        Ok(self.results.clone())
    }
}

/// Evaluator with scripted verdicts
pub struct MockEvaluator {
    ranking: RankingVerdict,
    validation: ImageValidation,
    pub rank_calls: AtomicUsize,
    pub judge_calls: AtomicUsize,
    pub rules_seen: Mutex<Vec<Option<String>>>,
}

impl MockEvaluator {
    pub fn new(ranking: RankingVerdict, validation: ImageValidation) -> Arc<Self> {
        Arc::new(Self {
            ranking,
            validation,
            rank_calls: AtomicUsize::new(0),
            judge_calls: AtomicUsize::new(0),
            rules_seen: Mutex::new(Vec::new()),
        })
    }

    /// Picks `index` with the given confidence; judges every image valid
    pub fn approving(index: usize, confidence: f32) -> Arc<Self> {
        Self::new(
            RankingVerdict {
                best_index: Some(index),
                confidence,
                reasoning: "clear subject".to_string(),
                is_correct: true,
                child_friendly: true,
            },
            ImageValidation {
                is_valid: true,
                confidence,
                reasoning: "matches the word".to_string(),
                child_friendly: true,
                suggested_replacement: None,
            },
        )
    }

    /// Rejects everything, as after an unreadable reply
    pub fn rejecting() -> Arc<Self> {
        Self::new(
            RankingVerdict::rejected("unreadable reply"),
            ImageValidation::rejected("unreadable reply"),
        )
    }

    pub fn rank_count(&self) -> usize {
        self.rank_calls.load(Ordering::SeqCst)
    }

    pub fn judge_count(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticEvaluator for MockEvaluator {
    fn name(&self) -> &'static str {
        "mock-evaluator"
    }

    async fn rank(
        &self,
        _request: &WordRequest,
        rule: Option<&str>,
        _candidates: &[ImageCandidate],
    ) -> RankingVerdict {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        self.rules_seen.lock().unwrap().push(rule.map(str::to_string));
        self.ranking.clone()
    }

    async fn judge(
        &self,
        _request: &WordRequest,
        rule: Option<&str>,
        _image_url: &str,
    ) -> ImageValidation {
        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        self.rules_seen.lock().unwrap().push(rule.map(str::to_string));
        self.validation.clone()
    }
}

/// Pipeline over the built-in catalog with the given components
pub fn pipeline_with(
    generator: Option<Arc<MockGenerator>>,
    providers: Vec<Arc<MockProvider>>,
    evaluator: Option<Arc<MockEvaluator>>,
) -> ImagePipeline {
    let catalog = Arc::new(ImageCatalog::builtin().unwrap());
    let mut builder = ImagePipeline::builder(catalog, Arc::new(ImageCache::new()));

    if let Some(generator) = generator {
        builder = builder.generator(generator);
    }
    let providers: Vec<Arc<dyn SearchProvider>> = providers
        .into_iter()
        .map(|p| p as Arc<dyn SearchProvider>)
        .collect();
    builder = builder.search_chain(SearchChain::new(providers, 5));
    if let Some(evaluator) = evaluator {
        builder = builder.evaluator(evaluator);
    }

    builder.min_confidence(0.9).build()
}
