//! Queue items, request builder and delivery receipts.

use crate::{OutboxError, OutboxResult};
use chrono::{DateTime, Utc};
use pulse_connection::AckResponse;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Completion callback, invoked exactly once with the final outcome.
pub type DeliveryCallback = Box<dyn FnOnce(OutboxResult<AckResponse>) + Send + 'static>;

/// Correlation id assigned at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where an item sits in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemState {
    Queued,
    Delivering,
    Backoff { until: Instant },
}

/// Serializable view of [`ItemState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPhase {
    Queued,
    Delivering,
    Backoff,
}

/// One outbound request waiting for delivery.
pub(crate) struct QueueItem {
    pub id: ItemId,
    pub event_name: String,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    pub attempt: u32,
    pub max_attempts: u32,
    pub on_complete: Option<DeliveryCallback>,
    pub state: ItemState,
}

impl QueueItem {
    /// Eligible for delivery at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.state {
            ItemState::Queued => true,
            ItemState::Delivering => false,
            ItemState::Backoff { until } => until <= now,
        }
    }

    pub fn snapshot(&self, now: Instant) -> QueueItemSnapshot {
        let (phase, retry_in_ms) = match self.state {
            ItemState::Queued => (ItemPhase::Queued, None),
            ItemState::Delivering => (ItemPhase::Delivering, None),
            ItemState::Backoff { until } => (
                ItemPhase::Backoff,
                Some(until.saturating_duration_since(now).as_millis() as u64),
            ),
        };

        QueueItemSnapshot {
            id: self.id,
            event_name: self.event_name.clone(),
            enqueued_at: self.enqueued_at,
            attempt: self.attempt,
            max_attempts: self.max_attempts,
            has_callback: self.on_complete.is_some(),
            phase,
            retry_in_ms,
        }
    }
}

impl fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueItem")
            .field("id", &self.id)
            .field("event_name", &self.event_name)
            .field("attempt", &self.attempt)
            .field("max_attempts", &self.max_attempts)
            .field("has_callback", &self.on_complete.is_some())
            .field("state", &self.state)
            .finish()
    }
}

/// Read-only diagnostic view of one queued item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemSnapshot {
    pub id: ItemId,
    pub event_name: String,
    pub enqueued_at: DateTime<Utc>,
    pub attempt: u32,
    pub max_attempts: u32,
    pub has_callback: bool,
    pub phase: ItemPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in_ms: Option<u64>,
}

/// Builder for a request handed to [`crate::Emitter::enqueue`].
pub struct OutboundRequest {
    pub(crate) event_name: String,
    pub(crate) payload: Value,
    pub(crate) on_complete: Option<DeliveryCallback>,
    pub(crate) max_attempts: Option<u32>,
}

impl OutboundRequest {
    pub fn new(event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            on_complete: None,
            max_attempts: None,
        }
    }

    /// Request an acknowledgment and be told the final outcome.
    ///
    /// Without a callback the request is fire-and-forget: one write, no ack,
    /// no retry.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(OutboxResult<AckResponse>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Override the attempt bound (minimum 1).
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub(crate) fn into_item(self, default_max_attempts: u32) -> QueueItem {
        QueueItem {
            id: ItemId::new(),
            event_name: self.event_name,
            payload: self.payload,
            enqueued_at: Utc::now(),
            attempt: 0,
            max_attempts: self.max_attempts.unwrap_or(default_max_attempts.max(1)),
            on_complete: self.on_complete,
            state: ItemState::Queued,
        }
    }
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("event_name", &self.event_name)
            .field("max_attempts", &self.max_attempts)
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

/// Future resolved once with an enqueued item's final outcome.
///
/// Resolves to [`OutboxError::Cancelled`] if the item is dropped by
/// `clear_queue` before completing.
#[derive(Debug)]
pub struct DeliveryReceipt {
    rx: oneshot::Receiver<OutboxResult<AckResponse>>,
}

impl DeliveryReceipt {
    pub(crate) fn new(rx: oneshot::Receiver<OutboxResult<AckResponse>>) -> Self {
        Self { rx }
    }
}

impl Future for DeliveryReceipt {
    type Output = OutboxResult<AckResponse>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(OutboxError::Cancelled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_request_defaults() {
        let item = OutboundRequest::new("client:send-message", json!({"text": "hi"})).into_item(3);
        assert_eq!(item.event_name, "client:send-message");
        assert_eq!(item.attempt, 0);
        assert_eq!(item.max_attempts, 3);
        assert!(item.on_complete.is_none());
        assert_eq!(item.state, ItemState::Queued);
    }

    #[test]
    fn test_max_attempts_has_floor_of_one() {
        let item = OutboundRequest::new("e", json!(null))
            .max_attempts(0)
            .into_item(3);
        assert_eq!(item.max_attempts, 1);

        let item = OutboundRequest::new("e", json!(null)).into_item(0);
        assert_eq!(item.max_attempts, 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = OutboundRequest::new("e", json!(null)).into_item(3);
        let b = OutboundRequest::new("e", json!(null)).into_item(3);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_due_and_snapshot() {
        let now = Instant::now();
        let mut item = OutboundRequest::new("e", json!(null))
            .on_complete(|_| {})
            .into_item(3);
        assert!(item.is_due(now));

        item.state = ItemState::Delivering;
        assert!(!item.is_due(now));
        assert_eq!(item.snapshot(now).phase, ItemPhase::Delivering);

        item.state = ItemState::Backoff {
            until: now + Duration::from_millis(1500),
        };
        assert!(!item.is_due(now));
        assert!(item.is_due(now + Duration::from_millis(1500)));

        let snapshot = item.snapshot(now);
        assert_eq!(snapshot.phase, ItemPhase::Backoff);
        assert_eq!(snapshot.retry_in_ms, Some(1500));
        assert!(snapshot.has_callback);
    }

    #[tokio::test]
    async fn test_receipt_cancelled_when_sender_dropped() {
        let (tx, rx) = oneshot::channel();
        drop(tx);
        let result = DeliveryReceipt::new(rx).await;
        assert!(matches!(result, Err(OutboxError::Cancelled)));
    }
}
