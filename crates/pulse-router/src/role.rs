//! Session role.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Trainer,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Client, Role::Trainer, Role::Manager, Role::Admin];

    /// Trainers, managers and admins share the staff event namespace and
    /// may manage groups.
    pub fn is_staff_level(self) -> bool {
        matches!(self, Role::Trainer | Role::Manager | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Trainer => "trainer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

/// Holds the current role; `None` until the session role is known.
///
/// Last write wins. Reads see the latest write; requests already handed to
/// the outbox keep the event name chosen when they were routed.
#[derive(Debug, Default)]
pub struct RoleCell {
    role: RwLock<Option<Role>>,
}

impl RoleCell {
    pub fn new(role: Option<Role>) -> Self {
        Self {
            role: RwLock::new(role),
        }
    }

    pub fn get(&self) -> Option<Role> {
        *self.role.read()
    }

    pub fn set(&self, role: Role) {
        let previous = self.role.write().replace(role);
        if previous != Some(role) {
            info!(role = %role, previous = ?previous, "Role set");
        }
    }

    pub fn clear(&self) {
        if let Some(previous) = self.role.write().take() {
            info!(previous = %previous, "Role cleared");
        }
    }
}
