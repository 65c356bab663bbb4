//! Routed operations and their wire event names.

use crate::Role;
use serde::Serialize;
use std::fmt;

const CLIENT_NAMESPACE: &str = "client";
const STAFF_NAMESPACE: &str = "trainer";

/// Every operation the router knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    // Direct messages
    SendMessage,
    GetMessages,
    GetContactList,
    MarkRead,
    Typing,

    // Groups
    SendGroupMessage,
    GetGroups,
    MarkGroupRead,
    GroupTyping,

    // Group management
    CreateGroup,
    AddGroupMember,
    RemoveGroupMember,
    UpdateGroup,
    DeleteGroup,
}

impl Operation {
    /// Operation name without the role namespace.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::SendMessage => "send-message",
            Operation::GetMessages => "get-messages",
            Operation::GetContactList => "get-contact-list",
            Operation::MarkRead => "mark-read",
            Operation::Typing => "typing",
            Operation::SendGroupMessage => "send-group-message",
            Operation::GetGroups => "get-groups",
            Operation::MarkGroupRead => "mark-group-read",
            Operation::GroupTyping => "group-typing",
            Operation::CreateGroup => "create-group",
            Operation::AddGroupMember => "add-group-member",
            Operation::RemoveGroupMember => "remove-group-member",
            Operation::UpdateGroup => "update-group",
            Operation::DeleteGroup => "delete-group",
        }
    }

    /// Only staff roles may perform this operation.
    pub fn requires_staff(self) -> bool {
        matches!(
            self,
            Operation::CreateGroup
                | Operation::AddGroupMember
                | Operation::RemoveGroupMember
                | Operation::UpdateGroup
                | Operation::DeleteGroup
        )
    }

    /// Best-effort signals that are never acknowledged or retried.
    pub fn is_volatile(self) -> bool {
        matches!(self, Operation::Typing | Operation::GroupTyping)
    }

    /// Whether `role` may perform this operation.
    pub fn permits(self, role: Option<Role>) -> bool {
        !self.requires_staff() || role.is_some_and(Role::is_staff_level)
    }

    /// Wire event name for `role`.
    ///
    /// Staff roles use the `trainer:` namespace; clients and an unset role
    /// use `client:`.
    pub fn event_name(self, role: Option<Role>) -> String {
        let namespace = if role.is_some_and(Role::is_staff_level) {
            STAFF_NAMESPACE
        } else {
            CLIENT_NAMESPACE
        };
        format!("{namespace}:{}", self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
