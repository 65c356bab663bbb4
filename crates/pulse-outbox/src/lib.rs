//! Outbound reliability queue for the Pulse realtime layer.
//!
//! This crate provides:
//! - `Emitter`: queue of outbound requests with ack correlation and bounded retry
//! - `OutboundRequest`: builder for one queued request
//! - `DeliveryReceipt`: future resolved exactly once with the final outcome
//! - `EmitterConfig`: backoff, attempt and ack-timeout settings
//!
//! # Delivery model
//!
//! ```text
//! enqueue ──▶ Queued ──▶ Delivering ──ack ok──▶ removed, callback(Ok)
//!               ▲             │
//!               │        ack failed / emit error / timeout
//!               │             ▼
//!               └──── Backoff(base * attempt) ──attempts exhausted──▶ removed, callback(Err)
//! ```
//!
//! Items without a completion callback are written once without an ack and
//! removed whatever happens. A disconnected connection is not a failure:
//! passes are skipped and no attempts are consumed until the owner calls
//! [`Emitter::trigger`] after connectivity returns.

mod emitter;
mod error;
mod item;
mod queue;
mod sender;

#[cfg(test)]
mod tests;

pub use emitter::{Emitter, QueueStatus};
pub use error::{OutboxError, OutboxResult};
pub use item::{
    DeliveryCallback, DeliveryReceipt, ItemId, ItemPhase, OutboundRequest, QueueItemSnapshot,
};
pub use sender::{
    EmitterConfig, DEFAULT_ACK_TIMEOUT_MS, DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
};
