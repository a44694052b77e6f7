//! Error types for the classifieds marketplace

use thiserror::Error;

/// Unified error type for marketplace startup and serving.
///
/// Request handlers map failures straight to HTTP status codes; this type
/// covers the paths outside a request, where there is no response to send.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// File or socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for marketplace operations
pub type Result<T> = std::result::Result<T, MarketError>;
