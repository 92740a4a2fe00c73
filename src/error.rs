//! Error types for the call risk classifier

use thiserror::Error;

/// Result type alias for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[derive(Error, Debug)]
pub enum ClassifierError {

    // =============================
    // Startup Errors (fatal)
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Oracle Errors (absorbed by the engine)
    // =============================

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Oracle timed out after {0}s")]
    OracleTimeout(u64),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid pattern: {0}")]
    RegexError(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
