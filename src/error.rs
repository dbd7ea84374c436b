//! Error types for tablegate.

use thiserror::Error;

/// Common error type for tablegate.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration error.
    ///
    /// Raised when no default connection has been established, when the
    /// configuration file is invalid, or when a connection names an unknown
    /// driver.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No gateway class could be resolved for a connection/table pair.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Unknown type tag, or a registered coercion rejected its input.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// Failure reported by a driver implementation.
    #[error("driver error: {0}")]
    Driver(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tablegate operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
