//! Connection error types.

use thiserror::Error;

/// Connection error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Not connected error
    #[error("Not connected")]
    NotConnected,

    /// The transport rejected the write
    #[error("Emit failed: {0}")]
    Emit(String),
}

/// Result type alias using ConnectionError.
pub type ConnectionResult<T> = Result<T, ConnectionError>;
