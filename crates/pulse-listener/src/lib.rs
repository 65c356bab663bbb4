//! Inbound typed dispatch for the Pulse realtime layer.
//!
//! This crate provides:
//! - `InboundEvent`: the fixed set of server-pushed event names
//! - `RealtimeUpdate`: decoded, typed payloads for each event
//! - `UpdateSink`: where decoded updates go (the application state layer)
//! - `Listener`: installs exactly one handler per event on the connection
//!
//! # Design Principles
//!
//! - One active handler per event name; re-registering replaces
//! - Every push reaches the sink once; duplicates are the sink's concern
//! - Ids accept strings or numbers; undecodable payloads are forwarded as `RealtimeUpdate::Unparsed`

mod error;
mod event;
mod listener;
mod sink;
mod update;

pub use error::{ListenerError, ListenerResult};
pub use event::{InboundEvent, UnknownEvent};
pub use listener::Listener;
pub use sink::{NullSink, RecordingSink, UpdateSink};
pub use update::{
    DirectMessage, GroupDeleted, GroupMembership, GroupMessage, GroupTyping, GroupUpdated,
    Presence, ReadReceipt, RealtimeUpdate, TypingIndicator,
};
