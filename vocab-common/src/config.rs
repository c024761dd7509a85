//! Configuration loading and API key resolution
//!
//! Bootstrap configuration lives in a TOML file. Every field has a
//! built-in default, so a missing file only produces a warning.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`VOCAB_CONFIG`)
//! 3. Platform config directory (`<config_dir>/vocab/<module>.toml`), if it exists
//! 4. Built-in defaults
//!
//! # API Key Priority
//!
//! 1. Environment variable (`VOCAB_*_API_KEY`)
//! 2. TOML `[api_keys]` table
//!
//! A key that resolves to nothing disables the component that needs it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VOCAB_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while the service is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server to
    pub bind_address: String,

    /// HTTP server port
    pub port: u16,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Replacement for the built-in image catalog (prompts, rules, fallbacks)
    pub catalog_path: Option<PathBuf>,

    /// External service credentials
    pub api_keys: ApiKeys,

    /// Outbound HTTP settings
    pub providers: ProviderSettings,

    /// Generation and vision model selection
    pub models: ModelSettings,

    /// Acceptance thresholds for ranked images
    pub thresholds: Thresholds,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5730,
            logging: LoggingConfig::default(),
            catalog_path: None,
            api_keys: ApiKeys::default(),
            providers: ProviderSettings::default(),
            models: ModelSettings::default(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// API keys as written in the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub unsplash: Option<String>,
    pub pixabay: Option<String>,
    pub pexels: Option<String>,
}

/// Outbound HTTP settings shared by all external clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub unsplash_base_url: String,
    pub pixabay_base_url: String,
    pub pexels_base_url: String,
    pub openai_base_url: String,

    /// Per-request timeout for every outbound call
    pub timeout_secs: u64,

    /// Fixed pause between successive search queries to one provider
    pub query_delay_ms: u64,

    /// Number of ranked candidates kept per provider
    pub top_n: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            unsplash_base_url: "https://api.unsplash.com".to_string(),
            pixabay_base_url: "https://pixabay.com".to_string(),
            pexels_base_url: "https://api.pexels.com".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
            query_delay_ms: 250,
            top_n: 5,
        }
    }
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub image_model: String,
    pub image_size: String,
    pub vision_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            vision_model: "gpt-4o".to_string(),
        }
    }
}

/// Acceptance thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum evaluator confidence for accepting a search candidate
    pub min_confidence: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.9,
        }
    }
}

/// External services that need a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyKind {
    OpenAi,
    Unsplash,
    Pixabay,
    Pexels,
}

impl ApiKeyKind {
    pub fn env_var(self) -> &'static str {
        match self {
            ApiKeyKind::OpenAi => "VOCAB_OPENAI_API_KEY",
            ApiKeyKind::Unsplash => "VOCAB_UNSPLASH_ACCESS_KEY",
            ApiKeyKind::Pixabay => "VOCAB_PIXABAY_API_KEY",
            ApiKeyKind::Pexels => "VOCAB_PEXELS_API_KEY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApiKeyKind::OpenAi => "OpenAI",
            ApiKeyKind::Unsplash => "Unsplash",
            ApiKeyKind::Pixabay => "Pixabay",
            ApiKeyKind::Pexels => "Pexels",
        }
    }
}

/// Where a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Toml,
}

/// A usable API key and its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

impl TomlConfig {
    fn toml_key(&self, kind: ApiKeyKind) -> Option<&String> {
        match kind {
            ApiKeyKind::OpenAi => self.api_keys.openai.as_ref(),
            ApiKeyKind::Unsplash => self.api_keys.unsplash.as_ref(),
            ApiKeyKind::Pixabay => self.api_keys.pixabay.as_ref(),
            ApiKeyKind::Pexels => self.api_keys.pexels.as_ref(),
        }
    }

    /// Resolve an API key from environment, then TOML
    ///
    /// Returns `None` when neither source holds a non-blank key.
    pub fn resolve_api_key(&self, kind: ApiKeyKind) -> Option<ResolvedKey> {
        let env_key = std::env::var(kind.env_var())
            .ok()
            .filter(|k| is_valid_key(k));
        let toml_key = self.toml_key(kind).filter(|k| is_valid_key(k)).cloned();

        if env_key.is_some() && toml_key.is_some() {
            warn!(
                "{} API key found in environment and TOML. Using environment (highest priority).",
                kind.label()
            );
        }

        if let Some(key) = env_key {
            info!("{} API key loaded from environment variable", kind.label());
            return Some(ResolvedKey {
                key: key.trim().to_string(),
                source: KeySource::Environment,
            });
        }

        if let Some(key) = toml_key {
            info!("{} API key loaded from TOML config", kind.label());
            return Some(ResolvedKey {
                key: key.trim().to_string(),
                source: KeySource::Toml,
            });
        }

        warn!(
            "{} API key not configured; set {} or [api_keys] in the TOML config",
            kind.label(),
            kind.env_var()
        );
        None
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Locates the bootstrap TOML file for one module
pub struct ConfigFileResolver {
    module_name: String,
}

impl ConfigFileResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Platform default path, whether or not it exists
    pub fn default_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vocab").join(format!("{}.toml", self.module_name)))
    }

    /// Resolve the config file path, or `None` to run on built-in defaults
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.default_path().filter(|p| p.exists())
    }
}

/// Load bootstrap config
///
/// A missing file is not an error: the service logs a warning and starts
/// on defaults. A file that exists but does not parse is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} does not exist, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write config atomically (temp file + rename)
///
/// On Unix the file is restricted to 0600 since it may hold API keys.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5730);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.providers.top_n, 5);
        assert_eq!(config.thresholds.min_confidence, 0.9);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [api_keys]
            pexels = "px-key"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.api_keys.pexels.as_deref(), Some("px-key"));
        assert!(config.api_keys.openai.is_none());
        assert_eq!(config.models.vision_model, "gpt-4o");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }
}
