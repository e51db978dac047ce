//! Error types for the poolchem_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for poolchem_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed scalar input (non-positive volume, non-positive log argument, NaN)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog or configuration inconsistency (unknown pool type, dangling reference)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error while reading a catalog, config or readings file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
