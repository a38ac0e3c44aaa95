//! Error types for the attribution engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The request carried no raw context at all
    #[error("No raw context supplied; attribution needs the retrieved evidence")]
    MissingContext,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
