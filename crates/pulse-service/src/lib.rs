//! Composition root for the Pulse realtime layer.
//!
//! One [`RealtimeService`] per connection lifetime: it owns the outbound
//! emitter, the role router on top of it and the inbound listener, all over
//! the same connection handle.

use pulse_config::{Config, OutboxSettings};
use pulse_connection::SharedConnection;
use pulse_listener::{Listener, ListenerResult, UpdateSink};
use pulse_outbox::{Emitter, EmitterConfig};
use pulse_router::ChatRouter;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// What `shutdown` tore down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShutdownSummary {
    pub listeners_removed: usize,
    pub items_dropped: usize,
}

/// Emitter settings derived from configuration.
pub fn emitter_config(settings: &OutboxSettings) -> EmitterConfig {
    EmitterConfig {
        base_backoff_ms: settings.base_backoff_ms,
        default_max_attempts: settings.max_attempts,
        ack_timeout_ms: settings.ack_timeout_ms,
    }
}

/// Realtime layer wired over one connection.
pub struct RealtimeService {
    connection: SharedConnection,
    router: ChatRouter,
    listener: Listener,
}

impl RealtimeService {
    /// Build on the current Tokio runtime.
    ///
    /// Panics outside a Tokio runtime.
    pub fn new(connection: SharedConnection, config: &Config) -> Self {
        Self::with_runtime(connection, config, Handle::current())
    }

    pub fn with_runtime(connection: SharedConnection, config: &Config, runtime: Handle) -> Self {
        let emitter = Emitter::new(connection.clone(), emitter_config(&config.outbox), runtime);
        let router = ChatRouter::new(emitter);
        let listener = Listener::new(connection.clone());

        Self {
            connection,
            router,
            listener,
        }
    }

    /// Bind `sink` and install every inbound handler.
    pub fn start(&self, sink: Arc<dyn UpdateSink>) -> ListenerResult<()> {
        self.listener.initialize(sink);
        self.listener.register_all()?;
        info!(
            connected = self.connection.is_connected(),
            listeners = self.listener.active_listeners_count(),
            "Realtime service started"
        );
        Ok(())
    }

    /// Flush the outbound backlog after the connection comes back.
    pub fn connection_restored(&self) {
        info!(pending = self.emitter().len(), "Connection restored");
        self.emitter().trigger();
    }

    /// Tear down for logout: drop handlers, pending requests and the role.
    pub fn shutdown(&self) -> ShutdownSummary {
        let summary = ShutdownSummary {
            listeners_removed: self.listener.unregister_all(),
            items_dropped: self.emitter().clear_queue(),
        };
        self.router.clear_role();
        info!(
            listeners_removed = summary.listeners_removed,
            items_dropped = summary.items_dropped,
            "Realtime service shut down"
        );
        summary
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.connection
    }

    pub fn emitter(&self) -> &Emitter {
        self.router.emitter()
    }

    pub fn router(&self) -> &ChatRouter {
        &self.router
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}
