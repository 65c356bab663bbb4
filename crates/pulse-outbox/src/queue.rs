//! In-memory outbox queue bookkeeping.
//!
//! Pure state: no I/O, no callbacks. The emitter takes items out for delivery
//! and reports outcomes back.

use crate::item::{ItemState, QueueItem};
use crate::{EmitterConfig, ItemId, QueueItemSnapshot};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// One delivery handed to the emitter for a single attempt.
#[derive(Debug, Clone)]
pub(crate) struct Dispatch {
    pub id: ItemId,
    pub event_name: String,
    pub payload: Value,
    pub wants_ack: bool,
    pub attempt: u32,
}

/// What a failed attempt means for its item.
#[derive(Debug)]
pub(crate) enum FailureOutcome {
    /// Item stays queued; retry after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Item removed; attempts used up.
    Exhausted(QueueItem),
    /// Item was cleared while in flight.
    Missing,
}

/// Ordered outbox queue, oldest first.
#[derive(Debug, Default)]
pub(crate) struct OutboxQueue {
    items: VecDeque<QueueItem>,
}

impl OutboxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Mark every due item as delivering, counting the attempt.
    pub fn take_due(&mut self, now: Instant) -> Vec<Dispatch> {
        self.items
            .iter_mut()
            .filter(|item| item.is_due(now))
            .map(|item| {
                item.attempt += 1;
                item.state = ItemState::Delivering;
                Dispatch {
                    id: item.id,
                    event_name: item.event_name.clone(),
                    payload: item.payload.clone(),
                    wants_ack: item.on_complete.is_some(),
                    attempt: item.attempt,
                }
            })
            .collect()
    }

    pub fn remove(&mut self, id: ItemId) -> Option<QueueItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(index)
    }

    /// Record a failed attempt: schedule a backoff or give the item up.
    pub fn record_failure(
        &mut self,
        id: ItemId,
        now: Instant,
        config: &EmitterConfig,
    ) -> FailureOutcome {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return FailureOutcome::Missing;
        };

        let item = &mut self.items[index];
        if item.attempt >= item.max_attempts {
            return match self.items.remove(index) {
                Some(item) => FailureOutcome::Exhausted(item),
                None => FailureOutcome::Missing,
            };
        }

        let delay = config.backoff_for(item.attempt);
        item.state = ItemState::Backoff { until: now + delay };
        FailureOutcome::Retry {
            attempt: item.attempt,
            delay,
        }
    }

    /// Undo an attempt that never reached the wire.
    ///
    /// The item goes back to `Queued` with its attempt count restored.
    /// Returns false if the item was cleared in flight.
    pub fn requeue(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.attempt = item.attempt.saturating_sub(1);
        item.state = ItemState::Queued;
        true
    }

    pub fn snapshot(&self, now: Instant) -> Vec<QueueItemSnapshot> {
        self.items.iter().map(|item| item.snapshot(now)).collect()
    }

    /// Drop everything, returning the number of items dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }
}
