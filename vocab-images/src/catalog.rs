//! Image catalog: hand-curated prompts, semantic rules and fallback URLs
//!
//! The tables are data, not code. The built-in catalog is compiled in from
//! `data/catalog.toml`; a replacement file can be named in the bootstrap
//! config. Word and category keys are lowercased on load so every lookup
//! is case-insensitive.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use vocab_common::{Error, Result};

use crate::types::WordRequest;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Number of search query templates every catalog must define
pub const QUERY_TEMPLATE_COUNT: usize = 5;

/// Per-word entries; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordEntry {
    /// Curated image used when automated sourcing fails
    pub fallback: Option<String>,
    /// Purpose-written generation prompt
    pub prompt: Option<String>,
    /// Semantic rule handed to the vision model
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub fallback: String,
}

/// Curated fallback pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedImage {
    pub url: String,
    /// True when the URL was picked for this exact word
    pub per_word: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCatalog {
    query_templates: Vec<String>,
    generic_prompt: String,
    default_image: String,
    #[serde(default)]
    words: HashMap<String, WordEntry>,
    #[serde(default)]
    categories: HashMap<String, CategoryEntry>,
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Lowercase table keys; two keys that collapse to the same word are an error
fn normalize_keys<V>(table: HashMap<String, V>, kind: &str) -> Result<HashMap<String, V>> {
    let mut normalized = HashMap::with_capacity(table.len());
    for (key, value) in table {
        let lowered = normalize(&key);
        if normalized.insert(lowered.clone(), value).is_some() {
            return Err(Error::Config(format!(
                "Catalog defines {} '{}' more than once (keys are case-insensitive)",
                kind, lowered
            )));
        }
    }
    Ok(normalized)
}

impl ImageCatalog {
    /// Parse and validate a catalog from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut catalog: ImageCatalog = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse catalog failed: {}", e)))?;

        catalog.words = normalize_keys(std::mem::take(&mut catalog.words), "word")?;
        catalog.categories = normalize_keys(std::mem::take(&mut catalog.categories), "category")?;

        catalog.validate()?;
        Ok(catalog)
    }

    /// Catalog compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read catalog failed ({}): {}", path.display(), e)))?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            words = catalog.words.len(),
            categories = catalog.categories.len(),
            "Loaded image catalog"
        );
        Ok(catalog)
    }

    /// Load the configured catalog, or the built-in one
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.query_templates.len() != QUERY_TEMPLATE_COUNT {
            return Err(Error::Config(format!(
                "Catalog must define exactly {} query templates, found {}",
                QUERY_TEMPLATE_COUNT,
                self.query_templates.len()
            )));
        }
        if self.query_templates.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config("Catalog query templates must not be blank".to_string()));
        }
        if self.generic_prompt.trim().is_empty() {
            return Err(Error::Config("Catalog generic_prompt must not be blank".to_string()));
        }
        if self.default_image.trim().is_empty() {
            return Err(Error::Config("Catalog default_image must not be blank".to_string()));
        }
        Ok(())
    }

    fn word(&self, word: &str) -> Option<&WordEntry> {
        self.words.get(&normalize(word))
    }

    /// Search queries for a word, in template order
    pub fn queries_for(&self, request: &WordRequest) -> Vec<String> {
        self.query_templates
            .iter()
            .map(|t| request.fill(t).trim().to_string())
            .collect()
    }

    /// Generation prompt: the word's own prompt, else the generic template,
    /// followed by the word's rule when it has one
    pub fn prompt_for(&self, request: &WordRequest) -> String {
        let entry = self.word(&request.word);
        let mut prompt = match entry.and_then(|e| e.prompt.as_deref()) {
            Some(prompt) => request.fill(prompt),
            None => request.fill(&self.generic_prompt),
        };
        if let Some(rule) = entry.and_then(|e| e.rule.as_deref()) {
            prompt.push(' ');
            prompt.push_str(rule);
        }
        prompt
    }

    /// Semantic rule for a word, if one was written
    pub fn rule_for(&self, word: &str) -> Option<&str> {
        self.word(word).and_then(|e| e.rule.as_deref())
    }

    /// Curated image: per-word entry, then category default, then global default
    pub fn curated_fallback(&self, word: &str, category: &str) -> CuratedImage {
        if let Some(url) = self.word(word).and_then(|e| e.fallback.as_ref()) {
            return CuratedImage {
                url: url.clone(),
                per_word: true,
            };
        }

        let url = self
            .categories
            .get(&normalize(category))
            .map(|c| c.fallback.clone())
            .unwrap_or_else(|| self.default_image.clone());

        CuratedImage {
            url,
            per_word: false,
        }
    }
}
