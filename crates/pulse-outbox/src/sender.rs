//! Single-attempt delivery with acknowledgment.

use crate::{OutboxError, OutboxResult};
use pulse_connection::{ack_fn, AckResponse, Connection};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Default base backoff in milliseconds.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1000;

/// Default attempt bound per item.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default acknowledgment timeout in milliseconds.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 10_000;

/// Emitter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Backoff unit; retry `n` waits `base_backoff_ms * n`.
    pub base_backoff_ms: u64,
    /// Attempt bound applied when a request does not set its own.
    pub default_max_attempts: u32,
    /// How long to wait for an acknowledgment before counting a failure.
    pub ack_timeout_ms: u64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
        }
    }
}

impl EmitterConfig {
    /// Delay before the retry that follows failed attempt `attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

/// Emit `event` once and wait for its acknowledgment.
///
/// Any `success: false` envelope, write error, malformed ack or timeout is
/// returned as an error; retrying is the caller's decision.
pub(crate) async fn deliver_with_ack(
    connection: &dyn Connection,
    event: &str,
    payload: Value,
    ack_timeout: Duration,
) -> OutboxResult<AckResponse> {
    let (tx, rx) = oneshot::channel();

    connection.emit(
        event,
        payload,
        Some(ack_fn(move |raw| {
            let _ = tx.send(raw);
        })),
    )?;

    debug!(event, timeout_ms = ack_timeout.as_millis() as u64, "Awaiting ack");

    let raw = match tokio::time::timeout(ack_timeout, rx).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(_)) => return Err(OutboxError::AckDropped),
        Err(_) => return Err(OutboxError::AckTimeout(ack_timeout)),
    };

    let response =
        AckResponse::from_value(raw).map_err(|e| OutboxError::MalformedAck(e.to_string()))?;

    if response.success {
        Ok(response)
    } else {
        Err(OutboxError::Rejected { response })
    }
}
