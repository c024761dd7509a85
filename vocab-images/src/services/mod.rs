//! Image sourcing services
//!
//! Outbound clients (search providers, OpenAI), the word cache and the
//! pipeline that ties them together.

pub mod image_cache;
pub mod image_generator;
pub mod image_pipeline;
pub mod openai_client;
pub mod pexels_client;
pub mod pixabay_client;
pub mod rate_limiter;
pub mod search_chain;
pub mod search_provider;
pub mod semantic_evaluator;
pub mod unsplash_client;

pub use image_cache::{CacheEntry, ImageCache};
pub use image_generator::{GenerationError, ImageGenerator, OpenAiImageGenerator};
pub use image_pipeline::{ImagePipeline, ImageStrategy, PipelineError, PipelineStatus};
pub use openai_client::{OpenAiClient, OpenAiError};
pub use pexels_client::PexelsClient;
pub use pixabay_client::PixabayClient;
pub use search_chain::{SearchChain, SearchOutcome};
pub use search_provider::{ProviderError, QualityThresholds, SearchProvider};
pub use semantic_evaluator::{OpenAiVisionEvaluator, RankingVerdict, SemanticEvaluator};
pub use unsplash_client::UnsplashClient;
