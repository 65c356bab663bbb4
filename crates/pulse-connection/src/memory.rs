//! In-process connection used by tests, demos and the smoke binary.

use crate::{Ack, AckResponse, Connection, ConnectionError, ConnectionResult, EventHandler};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// How the simulated server answers one emit.
#[derive(Debug, Clone)]
pub enum AckBehavior {
    /// Call the ack immediately with this raw payload.
    Respond(Value),
    /// Fail the write itself; the ack is never called.
    Fail(String),
    /// Accept the write and hold the ack until `resolve_pending_acks`.
    Silent,
}

impl AckBehavior {
    /// Acknowledge with `{ success: true, data }`.
    pub fn success(data: Value) -> Self {
        Self::Respond(AckResponse::ok(data).to_value())
    }

    /// Acknowledge with `{ success: false, error }`.
    pub fn rejected(error: &str) -> Self {
        Self::Respond(AckResponse::failure(error).to_value())
    }
}

/// One recorded emit.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub event: String,
    pub payload: Value,
    pub with_ack: bool,
    pub at: Instant,
}

type Responder = Box<dyn FnMut(&str, &Value) -> AckBehavior + Send>;

/// Scriptable connection that records emits and lets callers push events.
pub struct MemoryConnection {
    connected: AtomicBool,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    emitted: Mutex<Vec<EmittedEvent>>,
    responder: Mutex<Responder>,
    pending_acks: Mutex<Vec<(String, Ack)>>,
}

impl MemoryConnection {
    /// A connected instance that acknowledges every emit with success.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            handlers: Mutex::new(HashMap::new()),
            emitted: Mutex::new(Vec::new()),
            responder: Mutex::new(Box::new(|_, _| AckBehavior::success(Value::Null))),
            pending_acks: Mutex::new(Vec::new()),
        }
    }

    /// A disconnected instance.
    pub fn disconnected() -> Self {
        let conn = Self::new();
        conn.set_connected(false);
        conn
    }

    /// Convenience constructor returning an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Flip the connected flag.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Script the server's answer per emit.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&str, &Value) -> AckBehavior + Send + 'static,
    {
        *self.responder.lock() = Box::new(responder);
    }

    /// Answer every emit the same way.
    pub fn respond_with(&self, behavior: AckBehavior) {
        self.set_responder(move |_, _| behavior.clone());
    }

    /// Simulate a server push, invoking every handler installed for `event`.
    ///
    /// Returns the number of handlers invoked.
    pub fn push(&self, event: &str, payload: Value) -> usize {
        let handlers = self.handlers.lock().get(event).cloned().unwrap_or_default();
        for handler in &handlers {
            handler(payload.clone());
        }
        handlers.len()
    }

    /// Every emit so far, oldest first.
    pub fn emitted(&self) -> Vec<EmittedEvent> {
        self.emitted.lock().clone()
    }

    /// Event names of every emit so far, oldest first.
    pub fn emitted_events(&self) -> Vec<String> {
        self.emitted.lock().iter().map(|e| e.event.clone()).collect()
    }

    /// Number of emits for `event`.
    pub fn emit_count(&self, event: &str) -> usize {
        self.emitted.lock().iter().filter(|e| e.event == event).count()
    }

    /// Total number of emits.
    pub fn total_emits(&self) -> usize {
        self.emitted.lock().len()
    }

    /// Forget recorded emits.
    pub fn clear_emitted(&self) {
        self.emitted.lock().clear();
    }

    /// Acks held back by [`AckBehavior::Silent`].
    pub fn pending_ack_count(&self) -> usize {
        self.pending_acks.lock().len()
    }

    /// Answer every held-back ack with `response`, returning how many were answered.
    pub fn resolve_pending_acks(&self, response: Value) -> usize {
        let pending: Vec<_> = self.pending_acks.lock().drain(..).collect();
        let count = pending.len();
        for (_, ack) in pending {
            ack(response.clone());
        }
        count
    }

    /// Number of handlers installed for `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.lock().get(event).map_or(0, Vec::len)
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("connected", &self.is_connected())
            .field("emitted", &self.total_emits())
            .finish_non_exhaustive()
    }
}

impl Connection for MemoryConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, event: &str, payload: Value, ack: Option<Ack>) -> ConnectionResult<()> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }

        let behavior = {
            let mut responder = self.responder.lock();
            (responder.as_mut())(event, &payload)
        };

        self.emitted.lock().push(EmittedEvent {
            event: event.to_string(),
            payload,
            with_ack: ack.is_some(),
            at: Instant::now(),
        });

        debug!(event, ?behavior, "MemoryConnection: emit");

        match behavior {
            AckBehavior::Respond(response) => {
                if let Some(ack) = ack {
                    ack(response);
                }
                Ok(())
            }
            AckBehavior::Fail(reason) => Err(ConnectionError::Emit(reason)),
            AckBehavior::Silent => {
                if let Some(ack) = ack {
                    self.pending_acks.lock().push((event.to_string(), ack));
                }
                Ok(())
            }
        }
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.handlers
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    fn off(&self, event: &str, handler: &EventHandler) {
        let mut handlers = self.handlers.lock();
        if let Some(list) = handlers.get_mut(event) {
            list.retain(|h| !Arc::ptr_eq(h, handler));
            if list.is_empty() {
                handlers.remove(event);
            }
        }
    }
}
