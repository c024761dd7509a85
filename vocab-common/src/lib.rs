//! # Vocabulary Common Library
//!
//! Shared code for the vocabulary microservices:
//! - Error types
//! - Bootstrap TOML configuration and config-file resolution
//! - API key resolution (environment → TOML)

pub mod config;
pub mod error;

pub use error::{Error, Result};
