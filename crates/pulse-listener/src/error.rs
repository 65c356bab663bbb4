//! Listener error types.

use crate::InboundEvent;
use thiserror::Error;

/// Listener error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// `register_all` or `register` was called before `initialize`.
    #[error("Listener not initialized: call initialize(sink) first")]
    NotInitialized,

    /// An inbound payload did not match its event's shape.
    #[error("Failed to decode {event} payload: {reason}")]
    Decode { event: InboundEvent, reason: String },
}

/// Result type alias using ListenerError.
pub type ListenerResult<T> = Result<T, ListenerError>;
