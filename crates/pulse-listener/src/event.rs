//! Well-known inbound event names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Server-pushed events the listener understands. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InboundEvent {
    // Direct messages
    NewDirectMessage,
    TypingIndicator,
    MessageReadReceipt,

    // Presence
    UserOnline,
    UserOffline,

    // Groups
    GroupNewMessage,
    GroupTyping,
    GroupMemberAdded,
    GroupMemberRemoved,
    GroupUpdated,
    GroupDeleted,
}

impl InboundEvent {
    pub const ALL: [InboundEvent; 11] = [
        InboundEvent::NewDirectMessage,
        InboundEvent::TypingIndicator,
        InboundEvent::MessageReadReceipt,
        InboundEvent::UserOnline,
        InboundEvent::UserOffline,
        InboundEvent::GroupNewMessage,
        InboundEvent::GroupTyping,
        InboundEvent::GroupMemberAdded,
        InboundEvent::GroupMemberRemoved,
        InboundEvent::GroupUpdated,
        InboundEvent::GroupDeleted,
    ];

    /// Wire event name.
    pub fn as_str(self) -> &'static str {
        match self {
            InboundEvent::NewDirectMessage => "new-direct-message",
            InboundEvent::TypingIndicator => "typing-indicator",
            InboundEvent::MessageReadReceipt => "message-read-receipt",
            InboundEvent::UserOnline => "user-online",
            InboundEvent::UserOffline => "user-offline",
            InboundEvent::GroupNewMessage => "group-new-message",
            InboundEvent::GroupTyping => "group-typing",
            InboundEvent::GroupMemberAdded => "group-member-added",
            InboundEvent::GroupMemberRemoved => "group-member-removed",
            InboundEvent::GroupUpdated => "group-updated",
            InboundEvent::GroupDeleted => "group-deleted",
        }
    }
}

impl fmt::Display for InboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown inbound event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for InboundEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InboundEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}
