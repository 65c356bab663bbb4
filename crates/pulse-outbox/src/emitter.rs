//! Emitter: owns the outbox queue and drives delivery.

use crate::item::DeliveryReceipt;
use crate::queue::{Dispatch, FailureOutcome, OutboxQueue};
use crate::sender::deliver_with_ack;
use crate::{EmitterConfig, ItemId, OutboundRequest, OutboxError, OutboxResult, QueueItemSnapshot};
use futures_util::future::join_all;
use parking_lot::Mutex;
use pulse_connection::{AckResponse, ConnectionError, SharedConnection};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Snapshot returned by [`Emitter::get_queue_status`].
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// Number of items in the queue.
    pub size: usize,
    /// Items, oldest first.
    pub items: Vec<QueueItemSnapshot>,
    /// Whether a processing pass is running.
    pub processing: bool,
}

struct EmitterState {
    queue: OutboxQueue,
    processing: bool,
    rerun_requested: bool,
}

impl EmitterState {
    /// Claim the pass. Returns false, and records the request, if a pass is
    /// already running.
    fn begin_pass(&mut self) -> bool {
        if self.processing {
            self.rerun_requested = true;
            return false;
        }
        self.processing = true;
        true
    }

    /// End one round of the running pass. Returns true if another round
    /// was requested; otherwise releases the pass in the same critical
    /// section so no request can slip in between.
    fn finish_round(&mut self) -> bool {
        if std::mem::replace(&mut self.rerun_requested, false) {
            return true;
        }
        self.processing = false;
        false
    }
}

struct Inner {
    connection: SharedConnection,
    config: EmitterConfig,
    runtime: Handle,
    state: Mutex<EmitterState>,
}

/// Outbound reliability queue.
///
/// Cheap to clone; clones share one queue. Construct one per connection
/// lifetime and hand clones to whatever composes chat or dashboard features.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<Inner>,
}

/// Releases the pass if it unwinds before `finish_round` does.
struct ProcessingGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.inner.state.lock();
            state.processing = false;
            state.rerun_requested = false;
        }
    }
}

impl Emitter {
    /// Create an emitter over `connection`.
    ///
    /// `runtime` is used to spawn processing passes and backoff timers.
    pub fn new(connection: SharedConnection, config: EmitterConfig, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection,
                config,
                runtime,
                state: Mutex::new(EmitterState {
                    queue: OutboxQueue::new(),
                    processing: false,
                    rerun_requested: false,
                }),
            }),
        }
    }

    /// Create with default configuration on the current runtime.
    ///
    /// Panics outside a Tokio runtime.
    pub fn with_defaults(connection: SharedConnection) -> Self {
        Self::new(connection, EmitterConfig::default(), Handle::current())
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.inner.config
    }

    /// Whether the underlying connection reports connected.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Queue a request and return its correlation id.
    ///
    /// Never fails; delivery happens asynchronously.
    pub fn enqueue(&self, request: OutboundRequest) -> ItemId {
        let item = request.into_item(self.inner.config.default_max_attempts);
        let id = item.id;

        debug!(
            id = %id,
            event = %item.event_name,
            max_attempts = item.max_attempts,
            has_callback = item.on_complete.is_some(),
            "Enqueued outbound event"
        );

        self.inner.state.lock().queue.push(item);
        self.trigger();
        id
    }

    /// Queue a request and get a future for its final outcome.
    ///
    /// A callback already set on `request` still runs, before the receipt
    /// resolves.
    pub fn enqueue_tracked(&self, mut request: OutboundRequest) -> (ItemId, DeliveryReceipt) {
        let (tx, rx) = oneshot::channel();
        let previous = request.on_complete.take();

        request.on_complete = Some(Box::new(move |result: OutboxResult<AckResponse>| {
            if let Some(previous) = previous {
                previous(result.clone());
            }
            let _ = tx.send(result);
        }));

        let id = self.enqueue(request);
        (id, DeliveryReceipt::new(rx))
    }

    /// Emit once and wait for the server's answer, bypassing the queue.
    ///
    /// Fails immediately with [`OutboxError::NotConnected`] when the
    /// connection is down; never retries.
    pub async fn enqueue_awaitable(&self, event: &str, payload: Value) -> OutboxResult<AckResponse> {
        if !self.is_connected() {
            warn!(event, "Not connected, rejecting awaitable request");
            return Err(OutboxError::NotConnected);
        }

        let result = deliver_with_ack(
            self.inner.connection.as_ref(),
            event,
            payload,
            self.inner.config.ack_timeout(),
        )
        .await;

        match &result {
            Ok(_) => debug!(event, "Awaitable request acknowledged"),
            Err(e) => warn!(event, error = %e, "Awaitable request failed"),
        }

        result
    }

    /// Best-effort emit without ack, queue or retry.
    pub fn emit_volatile(&self, event: &str, payload: Value) -> OutboxResult<()> {
        if !self.is_connected() {
            debug!(event, "Not connected, dropping volatile event");
            return Err(OutboxError::NotConnected);
        }

        self.inner.connection.emit(event, payload, None)?;
        Ok(())
    }

    /// Spawn a processing pass.
    ///
    /// Call this when connectivity is restored; the emitter never polls.
    pub fn trigger(&self) {
        let emitter = self.clone();
        self.inner.runtime.spawn(async move {
            emitter.process_queue().await;
        });
    }

    /// Run processing passes until no further pass was requested.
    ///
    /// Returns immediately if another pass is already running; that pass
    /// picks up the request once it finishes its current round.
    pub async fn process_queue(&self) {
        if !self.inner.state.lock().begin_pass() {
            debug!("Outbox pass already running");
            return;
        }

        let mut guard = ProcessingGuard {
            inner: &self.inner,
            armed: true,
        };

        loop {
            self.run_pass().await;

            if !self.inner.state.lock().finish_round() {
                break;
            }
        }
        guard.armed = false;
    }

    async fn run_pass(&self) {
        if !self.is_connected() {
            debug!(
                pending = self.len(),
                "Not connected, skipping outbox pass"
            );
            return;
        }

        let dispatches = self.inner.state.lock().queue.take_due(Instant::now());
        if dispatches.is_empty() {
            return;
        }

        debug!(count = dispatches.len(), "Processing outbox pass");
        join_all(dispatches.into_iter().map(|d| self.dispatch(d))).await;
    }

    async fn dispatch(&self, dispatch: Dispatch) {
        if !dispatch.wants_ack {
            let result = self
                .inner
                .connection
                .emit(&dispatch.event_name, dispatch.payload, None);

            if matches!(result, Err(ConnectionError::NotConnected)) {
                self.inner.state.lock().queue.requeue(dispatch.id);
                debug!(id = %dispatch.id, event = %dispatch.event_name, "Connection dropped before write, item requeued");
                return;
            }
            self.inner.state.lock().queue.remove(dispatch.id);

            match result {
                Ok(()) => debug!(id = %dispatch.id, event = %dispatch.event_name, "Fire-and-forget event sent"),
                Err(e) => warn!(
                    id = %dispatch.id,
                    event = %dispatch.event_name,
                    error = %e,
                    "Fire-and-forget event failed, dropping"
                ),
            }
            return;
        }

        let result = deliver_with_ack(
            self.inner.connection.as_ref(),
            &dispatch.event_name,
            dispatch.payload.clone(),
            self.inner.config.ack_timeout(),
        )
        .await;

        match result {
            Ok(response) => {
                let item = self.inner.state.lock().queue.remove(dispatch.id);
                match item {
                    Some(item) => {
                        info!(
                            id = %dispatch.id,
                            event = %dispatch.event_name,
                            attempt = dispatch.attempt,
                            "Outbound event acknowledged"
                        );
                        if let Some(callback) = item.on_complete {
                            callback(Ok(response));
                        }
                    }
                    None => debug!(id = %dispatch.id, "Acknowledged item was cleared in flight"),
                }
            }
            Err(e) => self.handle_failure(&dispatch, e),
        }
    }

    fn handle_failure(&self, dispatch: &Dispatch, error: OutboxError) {
        // Nothing reached the server; the attempt does not count
        if !error.is_transient() {
            let requeued = self.inner.state.lock().queue.requeue(dispatch.id);
            debug!(
                id = %dispatch.id,
                event = %dispatch.event_name,
                error = %error,
                requeued,
                "Attempt never reached the server, item requeued"
            );
            return;
        }

        let outcome = self.inner.state.lock().queue.record_failure(
            dispatch.id,
            Instant::now(),
            &self.inner.config,
        );

        match outcome {
            FailureOutcome::Retry { attempt, delay } => {
                warn!(
                    id = %dispatch.id,
                    event = %dispatch.event_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Delivery failed, retrying"
                );
                self.schedule_retry(delay);
            }
            FailureOutcome::Exhausted(item) => {
                error!(
                    id = %dispatch.id,
                    event = %dispatch.event_name,
                    attempts = item.attempt,
                    error = %error,
                    "Max attempts exceeded"
                );
                if let Some(callback) = item.on_complete {
                    callback(Err(OutboxError::AttemptsExhausted {
                        attempts: item.attempt,
                        last_error: Box::new(error),
                    }));
                }
            }
            FailureOutcome::Missing => {
                debug!(id = %dispatch.id, error = %error, "Failed item was cleared in flight");
            }
        }
    }

    fn schedule_retry(&self, delay: Duration) {
        let emitter = self.clone();
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            emitter.process_queue().await;
        });
    }

    /// Read-only snapshot of the queue.
    pub fn get_queue_status(&self) -> QueueStatus {
        let state = self.inner.state.lock();
        QueueStatus {
            size: state.queue.len(),
            items: state.queue.snapshot(Instant::now()),
            processing: state.processing,
        }
    }

    /// Drop every pending item without invoking callbacks.
    ///
    /// Receipts of dropped items resolve to [`OutboxError::Cancelled`].
    pub fn clear_queue(&self) -> usize {
        let cleared = self.inner.state.lock().queue.clear();
        info!(cleared, "Outbox queue cleared");
        cleared
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().queue.is_empty()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("config", &self.inner.config)
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}
