//! Error types
//!
//! Controllers do not fail on missing elements; they skip the dependent
//! action. The types here cover the places that genuinely can fail: fetching
//! transcript JSON, mutating a real DOM, and reading site configuration.

use thiserror::Error;

/// Failure to load one transcript record.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load transcript: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed transcript JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure reported by a document implementation while mutating the tree.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("DOM operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid site configuration: {0}")]
    Invalid(#[from] figment::Error),
}
