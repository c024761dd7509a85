//! Core types shared by the image pipeline and the HTTP layer
//!
//! Everything serialised to the client uses camelCase field names, which is
//! what the flashcard front end expects.

use serde::{Deserialize, Serialize};

/// The word an image is being resolved for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRequest {
    /// English vocabulary word
    pub word: String,
    /// German translation shown on the flashcard
    pub translation: String,
    /// Vocabulary category (e.g. "animals", "family")
    pub category: String,
}

impl WordRequest {
    pub fn new(
        word: impl Into<String>,
        translation: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
            category: category.into(),
        }
    }

    /// Substitute `{word}`, `{translation}` and `{category}` in a template
    pub fn fill(&self, template: &str) -> String {
        template
            .replace("{word}", &self.word)
            .replace("{translation}", &self.translation)
            .replace("{category}", &self.category)
    }
}

/// One photo returned by a search provider
///
/// Built per request from a provider response and dropped after ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    /// Display-size image URL
    pub url: String,
    /// Small preview URL sent to the vision model
    pub thumbnail_url: String,
    /// Provider label ("unsplash", "pixabay", "pexels")
    pub provider: &'static str,
    /// Download count (0 when the provider does not report it)
    pub downloads: u64,
    /// Like count (0 when the provider does not report it)
    pub likes: u64,
    pub width: u32,
    pub height: u32,
    /// Free-text description or tags
    pub description: String,
}

impl ImageCandidate {
    /// Pixel area in pixels
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Output of `find_best_image`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResult {
    pub best_image_url: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Human-readable justification
    pub reasoning: String,
    /// Whether a semantic check passed
    pub logic_check: bool,
}

impl ImageSearchResult {
    /// Create a result with confidence clamped to [0, 1]
    pub fn new(
        url: impl Into<String>,
        confidence: f32,
        reasoning: impl Into<String>,
        logic_check: bool,
    ) -> Self {
        Self {
            best_image_url: url.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            logic_check,
        }
    }
}

/// Semantic validation of one image against one word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageValidation {
    pub is_valid: bool,
    pub confidence: f32,
    pub reasoning: String,
    pub child_friendly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_replacement: Option<String>,
}

impl ImageValidation {
    /// Conservative record used whenever the evaluator cannot give an answer
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            confidence: 0.0,
            reasoning: reason.into(),
            child_friendly: false,
            suggested_replacement: None,
        }
    }
}

/// Per-word record returned when validating a whole category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItemValidation {
    pub word: String,
    pub validation: ImageValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_url: Option<String>,
}
