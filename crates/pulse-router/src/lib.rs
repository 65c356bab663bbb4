//! Role-conditioned request routing for the Pulse realtime layer.
//!
//! This crate provides:
//! - `Role` / `RoleCell`: the session role and the slot holding it
//! - `Operation`: every routed chat operation and its wire event name
//! - `ChatRouter`: convenience methods that pick the event name by role and
//!   delegate to the outbox
//!
//! Callers never see the client/staff split. Group management is gated to
//! staff roles and rejected before anything reaches the connection.

mod error;
mod operation;
mod role;
mod router;

pub use error::{RouterError, RouterResult};
pub use operation::Operation;
pub use role::{ParseRoleError, Role, RoleCell};
pub use router::ChatRouter;
