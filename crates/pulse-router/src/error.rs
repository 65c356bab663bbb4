//! Router error types.

use crate::{Operation, Role};
use pulse_outbox::OutboxError;
use thiserror::Error;

/// Router error type.
#[derive(Error, Debug, Clone)]
pub enum RouterError {
    /// The current role may not perform this operation. Nothing was sent.
    #[error("{operation} requires a staff role (current role: {})", .role.map_or("unset", Role::as_str))]
    Unauthorized {
        operation: Operation,
        role: Option<Role>,
    },

    #[error(transparent)]
    Outbox(#[from] OutboxError),
}

impl RouterError {
    /// The server-reported reason, if the request reached the server.
    pub fn server_reason(&self) -> Option<String> {
        match self {
            Self::Outbox(e) => e.server_reason(),
            Self::Unauthorized { .. } => None,
        }
    }
}

/// Result type alias using RouterError.
pub type RouterResult<T> = Result<T, RouterError>;
