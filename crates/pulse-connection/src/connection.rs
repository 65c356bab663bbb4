//! The connection accessor contract.

use crate::ConnectionResult;
use serde_json::Value;
use std::sync::Arc;

/// One-shot acknowledgment callback passed alongside an emit.
///
/// The transport calls it at most once with the server's raw ack payload.
pub type Ack = Box<dyn FnOnce(Value) + Send + 'static>;

/// Handler installed for an inbound event name.
///
/// Handlers are compared by `Arc::ptr_eq` when removed with [`Connection::off`].
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// Connection handle shared between the outbound queue and the inbound listener.
pub type SharedConnection = Arc<dyn Connection>;

/// A persistent bidirectional connection to the backend.
///
/// Implementations own framing, transport fallback and their own reconnection
/// policy. The realtime layer only needs these four primitives.
pub trait Connection: Send + Sync {
    /// Whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Write `event` with `payload`.
    ///
    /// When `ack` is present the transport must call it once the server
    /// acknowledges. An `Err` means the write itself failed and `ack` will
    /// never be called.
    fn emit(&self, event: &str, payload: Value, ack: Option<Ack>) -> ConnectionResult<()>;

    /// Install `handler` for `event`.
    fn on(&self, event: &str, handler: EventHandler);

    /// Remove a previously installed `handler` for `event`.
    fn off(&self, event: &str, handler: &EventHandler);
}

/// Wrap a closure as an [`EventHandler`].
pub fn event_handler<F>(f: F) -> EventHandler
where
    F: Fn(Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as an [`Ack`].
pub fn ack_fn<F>(f: F) -> Ack
where
    F: FnOnce(Value) + Send + 'static,
{
    Box::new(f)
}
