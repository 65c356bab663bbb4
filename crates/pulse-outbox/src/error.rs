//! Outbox error types.

use pulse_connection::{AckResponse, ConnectionError};
use std::time::Duration;
use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug, Clone)]
pub enum OutboxError {
    /// The connection is down; nothing was written.
    #[error("Not connected")]
    NotConnected,

    /// The server acknowledged with `success: false`.
    #[error("Server rejected request: {}", .response.failure_reason())]
    Rejected { response: AckResponse },

    /// The transport failed to write the event.
    #[error("Emit failed: {0}")]
    Emit(String),

    /// No acknowledgment arrived in time.
    #[error("No acknowledgment within {0:?}")]
    AckTimeout(Duration),

    /// The transport dropped the ack callback without calling it.
    #[error("Acknowledgment dropped by transport")]
    AckDropped,

    /// The ack payload was not a response envelope.
    #[error("Malformed acknowledgment: {0}")]
    MalformedAck(String),

    /// Max attempts reached; carries the last transient failure.
    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    AttemptsExhausted {
        attempts: u32,
        last_error: Box<OutboxError>,
    },

    /// The item was dropped by `clear_queue` before it completed.
    #[error("Delivery cancelled")]
    Cancelled,
}

impl OutboxError {
    /// Whether this failure consumes one attempt and may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. }
                | Self::Emit(_)
                | Self::AckTimeout(_)
                | Self::AckDropped
                | Self::MalformedAck(_)
        )
    }

    /// The server-reported reason, when the server answered at all.
    pub fn server_reason(&self) -> Option<String> {
        match self {
            Self::Rejected { response } => Some(response.failure_reason()),
            Self::AttemptsExhausted { last_error, .. } => last_error.server_reason(),
            _ => None,
        }
    }
}

impl From<ConnectionError> for OutboxError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotConnected => Self::NotConnected,
            ConnectionError::Emit(reason) => Self::Emit(reason),
        }
    }
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(OutboxError::Emit("closed".into()).is_transient());
        assert!(OutboxError::AckTimeout(Duration::from_secs(1)).is_transient());
        assert!(OutboxError::Rejected {
            response: AckResponse::failure("busy")
        }
        .is_transient());
        assert!(!OutboxError::NotConnected.is_transient());
        assert!(!OutboxError::Cancelled.is_transient());
    }

    #[test]
    fn test_server_reason_through_exhaustion() {
        let err = OutboxError::AttemptsExhausted {
            attempts: 3,
            last_error: Box::new(OutboxError::Rejected {
                response: AckResponse::failure("recipient blocked"),
            }),
        };
        assert_eq!(err.server_reason().as_deref(), Some("recipient blocked"));
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("recipient blocked"));
    }

    #[test]
    fn test_from_connection_error() {
        assert!(matches!(
            OutboxError::from(ConnectionError::NotConnected),
            OutboxError::NotConnected
        ));
        assert!(matches!(
            OutboxError::from(ConnectionError::Emit("eof".into())),
            OutboxError::Emit(reason) if reason == "eof"
        ));
    }
}
