//! Message and participant types.
//!
//! A [`Message`] is created either on send (optimistic, `Sending`) or on
//! receipt (`Delivered`), and is mutated in place through delivery-status
//! transitions keyed by its id. Messages are never removed except by an
//! explicit history clear; a failed message stays visible so the visitor can
//! retry it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The widget visitor.
    Visitor,
    /// The support agent on the remote side.
    Agent,
    /// System-generated notice (join/leave, session events).
    System,
}

/// Delivery state of a single message.
///
/// Outbound messages move `Sending -> Sent | Failed`; inbound messages are
/// created as `Delivered`. A message must never remain stuck at `Sending`
/// once its send attempt resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Delivered,
    Failed,
}

/// Content kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    System,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier (UUID format). Optimistic local echoes and
    /// any server-confirmed copy are correlated by this id, never by list
    /// position.
    pub id: String,
    /// The message body.
    pub content: String,
    /// Who produced the message.
    pub sender: Sender,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
    /// Current delivery state.
    pub delivery_status: DeliveryStatus,
    /// Content kind.
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    /// Creates an optimistic outbound visitor message in `Sending` state.
    pub fn outbound(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender: Sender::Visitor,
            timestamp: Utc::now().to_rfc3339(),
            delivery_status: DeliveryStatus::Sending,
            kind: MessageKind::Text,
        }
    }

    /// Creates an inbound message in `Delivered` state.
    pub fn inbound(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now().to_rfc3339(),
            delivery_status: DeliveryStatus::Delivered,
            kind: match sender {
                Sender::System => MessageKind::System,
                _ => MessageKind::Text,
            },
        }
    }
}

/// Presence status of the remote agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPresence {
    Online,
    Away,
    Busy,
    #[default]
    Offline,
}

/// The support agent attached to a conversation.
///
/// Replaced wholesale on each inbound agent-status event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub presence: AgentPresence,
    pub is_typing: bool,
}

/// The widget visitor's identity for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Assigned once per browser session and reused across reconnects of the
    /// same visit.
    pub session_id: String,
}

/// Visitor identity as supplied by the host before a session id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl VisitorDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: Some(email.into()),
        }
    }

    /// Binds the draft to a session id, producing the stored identity.
    pub fn into_visitor(self, session_id: String) -> VisitorInfo {
        VisitorInfo {
            name: self.name,
            email: self.email,
            session_id,
        }
    }
}
