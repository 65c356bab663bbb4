//! Scenario tests for the outbox emitter.
//!
//! - `delivery.rs`     - success path, fire-and-forget items, exactly-once callbacks
//! - `retry.rs`        - linear backoff, attempt bound, ack timeouts
//! - `connectivity.rs` - disconnected passes and restore triggers
//! - `clear.rs`        - clearing the queue and cancelled receipts
//! - `processing.rs`   - the single-pass guard and concurrent delivery
//! - `awaitable.rs`    - single-attempt requests and volatile emits

mod awaitable;

use crate::{Emitter, EmitterConfig, OutboundRequest, OutboxResult};
use pulse_connection::{AckResponse, MemoryConnection};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Emitter over `conn` with default configuration.
fn emitter(conn: &Arc<MemoryConnection>) -> Emitter {
    Emitter::with_defaults(conn.clone())
}

/// Emitter over `conn` with a custom configuration.
fn emitter_with(conn: &Arc<MemoryConnection>, config: EmitterConfig) -> Emitter {
    Emitter::new(conn.clone(), config, Handle::current())
}

/// Let spawned passes run without crossing any backoff.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Counts callback invocations and keeps the last outcome.
#[derive(Clone, Default)]
struct CallbackTracker {
    calls: Arc<AtomicUsize>,
    last: Arc<parking_lot::Mutex<Option<OutboxResult<AckResponse>>>>,
}

impl CallbackTracker {
    fn request(&self, event: &str) -> OutboundRequest {
        let tracker = self.clone();
        OutboundRequest::new(event, json!({"event": event})).on_complete(move |result| {
            tracker.calls.fetch_add(1, Ordering::SeqCst);
            *tracker.last.lock() = Some(result);
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last(&self) -> Option<OutboxResult<AckResponse>> {
        self.last.lock().clone()
    }
}

/// Basic workflow: enqueue, acknowledge, callback, empty queue.
#[tokio::test(start_paused = true)]
async fn basic_workflow() {
    let conn = MemoryConnection::shared();
    let emitter = emitter(&conn);
    let tracker = CallbackTracker::default();

    let id = emitter.enqueue(tracker.request("client:send-message"));
    assert_eq!(emitter.len(), 1);
    assert_eq!(emitter.get_queue_status().items[0].id, id);

    settle().await;

    assert_eq!(tracker.calls(), 1);
    assert!(matches!(tracker.last(), Some(Ok(resp)) if resp.success));
    assert!(emitter.is_empty());
    assert_eq!(conn.emit_count("client:send-message"), 1);
    assert!(conn.emitted()[0].with_ack);
}
