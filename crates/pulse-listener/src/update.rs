//! Typed inbound payloads.

use crate::{InboundEvent, ListenerError, ListenerResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ids arrive as strings or bare numbers depending on the backend.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(serde_json::Number),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn lenient_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Vec::<RawId>::deserialize(deserializer)?
        .into_iter()
        .map(String::from)
        .collect())
}

fn typing_default() -> bool {
    true
}

/// A direct message pushed to the recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_id")]
    pub sender_id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicator {
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub conversation_id: Option<String>,
    #[serde(default = "typing_default")]
    pub is_typing: bool,
}

/// Messages the other party has read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    #[serde(deserialize_with = "lenient_id")]
    pub reader_id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub message_ids: Vec<String>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

/// Online or offline transition for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_id")]
    pub group_id: String,
    #[serde(deserialize_with = "lenient_id")]
    pub sender_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTyping {
    #[serde(deserialize_with = "lenient_id")]
    pub group_id: String,
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: String,
    #[serde(default = "typing_default")]
    pub is_typing: bool,
}

/// A member joining or leaving a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    #[serde(deserialize_with = "lenient_id")]
    pub group_id: String,
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Changed group metadata. Absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdated {
    #[serde(deserialize_with = "lenient_id")]
    pub group_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDeleted {
    #[serde(deserialize_with = "lenient_id")]
    pub group_id: String,
}

/// A decoded inbound event, ready for the state layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeUpdate {
    NewDirectMessage(DirectMessage),
    Typing(TypingIndicator),
    ReadReceipt(ReadReceipt),
    UserOnline(Presence),
    UserOffline(Presence),
    GroupMessage(GroupMessage),
    GroupTyping(GroupTyping),
    GroupMemberAdded(GroupMembership),
    GroupMemberRemoved(GroupMembership),
    GroupUpdated(GroupUpdated),
    GroupDeleted(GroupDeleted),
    /// A push whose body did not match the event's shape, passed through raw.
    Unparsed { event: InboundEvent, payload: Value },
}

impl RealtimeUpdate {
    /// Decode `payload` as the body of `event`.
    pub fn decode(event: InboundEvent, payload: &Value) -> ListenerResult<Self> {
        let update = match event {
            InboundEvent::NewDirectMessage => Self::NewDirectMessage(parse(event, payload)?),
            InboundEvent::TypingIndicator => Self::Typing(parse(event, payload)?),
            InboundEvent::MessageReadReceipt => Self::ReadReceipt(parse(event, payload)?),
            InboundEvent::UserOnline => Self::UserOnline(parse(event, payload)?),
            InboundEvent::UserOffline => Self::UserOffline(parse(event, payload)?),
            InboundEvent::GroupNewMessage => Self::GroupMessage(parse(event, payload)?),
            InboundEvent::GroupTyping => Self::GroupTyping(parse(event, payload)?),
            InboundEvent::GroupMemberAdded => Self::GroupMemberAdded(parse(event, payload)?),
            InboundEvent::GroupMemberRemoved => Self::GroupMemberRemoved(parse(event, payload)?),
            InboundEvent::GroupUpdated => Self::GroupUpdated(parse(event, payload)?),
            InboundEvent::GroupDeleted => Self::GroupDeleted(parse(event, payload)?),
        };
        Ok(update)
    }

    /// The event this update was decoded from.
    pub fn event(&self) -> InboundEvent {
        match self {
            Self::NewDirectMessage(_) => InboundEvent::NewDirectMessage,
            Self::Typing(_) => InboundEvent::TypingIndicator,
            Self::ReadReceipt(_) => InboundEvent::MessageReadReceipt,
            Self::UserOnline(_) => InboundEvent::UserOnline,
            Self::UserOffline(_) => InboundEvent::UserOffline,
            Self::GroupMessage(_) => InboundEvent::GroupNewMessage,
            Self::GroupTyping(_) => InboundEvent::GroupTyping,
            Self::GroupMemberAdded(_) => InboundEvent::GroupMemberAdded,
            Self::GroupMemberRemoved(_) => InboundEvent::GroupMemberRemoved,
            Self::GroupUpdated(_) => InboundEvent::GroupUpdated,
            Self::GroupDeleted(_) => InboundEvent::GroupDeleted,
            Self::Unparsed { event, .. } => *event,
        }
    }
}

fn parse<T: DeserializeOwned>(event: InboundEvent, payload: &Value) -> ListenerResult<T> {
    T::deserialize(payload).map_err(|e| ListenerError::Decode {
        event,
        reason: e.to_string(),
    })
}
