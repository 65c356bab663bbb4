//! Listener: owns inbound handler registrations on the connection.

use crate::{InboundEvent, ListenerError, ListenerResult, RealtimeUpdate, UpdateSink};
use parking_lot::{Mutex, RwLock};
use pulse_connection::{event_handler, EventHandler, SharedConnection};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Installs one decoding handler per inbound event and forwards to the sink.
pub struct Listener {
    connection: SharedConnection,
    sink: RwLock<Option<Arc<dyn UpdateSink>>>,
    registrations: Mutex<BTreeMap<InboundEvent, EventHandler>>,
}

impl Listener {
    pub fn new(connection: SharedConnection) -> Self {
        Self {
            connection,
            sink: RwLock::new(None),
            registrations: Mutex::new(BTreeMap::new()),
        }
    }

    /// Bind the destination for updates.
    ///
    /// Handlers capture the sink when registered; call `register_all` again
    /// after rebinding to route existing events to the new sink.
    pub fn initialize(&self, sink: Arc<dyn UpdateSink>) {
        *self.sink.write() = Some(sink);
        debug!("Listener initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Install handlers for every well-known event, replacing existing ones.
    pub fn register_all(&self) -> ListenerResult<()> {
        let sink = self.bound_sink()?;
        for event in InboundEvent::ALL {
            self.install(event, sink.clone());
        }
        info!(count = InboundEvent::ALL.len(), "Registered inbound listeners");
        Ok(())
    }

    /// Install the handler for a single event, replacing any existing one.
    pub fn register(&self, event: InboundEvent) -> ListenerResult<()> {
        let sink = self.bound_sink()?;
        self.install(event, sink);
        Ok(())
    }

    /// Remove the handler for `event`. Returns whether one was active.
    pub fn unregister(&self, event: InboundEvent) -> bool {
        let Some(handler) = self.registrations.lock().remove(&event) else {
            return false;
        };
        self.connection.off(event.as_str(), &handler);
        debug!(event = %event, "Unregistered inbound listener");
        true
    }

    /// Remove every active handler. Returns how many were removed.
    pub fn unregister_all(&self) -> usize {
        let registrations = std::mem::take(&mut *self.registrations.lock());
        let count = registrations.len();
        for (event, handler) in registrations {
            self.connection.off(event.as_str(), &handler);
        }
        if count > 0 {
            info!(count, "Unregistered inbound listeners");
        }
        count
    }

    pub fn active_listeners_count(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Events with an active handler.
    pub fn active_events(&self) -> Vec<InboundEvent> {
        self.registrations.lock().keys().copied().collect()
    }

    fn bound_sink(&self) -> ListenerResult<Arc<dyn UpdateSink>> {
        self.sink.read().clone().ok_or(ListenerError::NotInitialized)
    }

    fn install(&self, event: InboundEvent, sink: Arc<dyn UpdateSink>) {
        let handler = event_handler(move |payload| {
            let update = match RealtimeUpdate::decode(event, &payload) {
                Ok(update) => {
                    debug!(event = %event, "Dispatching inbound event");
                    update
                }
                Err(e) => {
                    warn!(event = %event, error = %e, "Forwarding inbound event unparsed");
                    RealtimeUpdate::Unparsed { event, payload }
                }
            };
            sink.apply(update);
        });

        let mut registrations = self.registrations.lock();
        if let Some(previous) = registrations.remove(&event) {
            self.connection.off(event.as_str(), &previous);
            debug!(event = %event, "Replaced inbound listener");
        }
        self.connection.on(event.as_str(), handler.clone());
        registrations.insert(event, handler);
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("initialized", &self.is_initialized())
            .field("active", &self.active_events())
            .finish_non_exhaustive()
    }
}
