//! Connection accessor for the Pulse realtime layer.
//!
//! This crate provides:
//! - `Connection`: the emit/on/off contract every transport adapter implements
//! - `AckResponse`: the `{ success, data, error, message }` wire envelope
//! - `MemoryConnection`: a scriptable in-process connection for tests and demos
//!
//! The transport itself (WebSocket framing, polling fallback, reconnection) lives
//! behind the trait and is not implemented here.

mod connection;
mod envelope;
mod error;
mod memory;

pub use connection::{ack_fn, event_handler, Ack, Connection, EventHandler, SharedConnection};
pub use envelope::AckResponse;
pub use error::{ConnectionError, ConnectionResult};
pub use memory::{AckBehavior, EmittedEvent, MemoryConnection};
