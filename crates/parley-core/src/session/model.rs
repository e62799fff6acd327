//! Chat session domain model.
//!
//! This module contains the core [`ChatSession`] entity: the single logical
//! state value that the controller mutates through its serialized update
//! path and persists after each committed transition.

use serde::{Deserialize, Serialize};

use super::chat_error::ChatError;
use super::message::{AgentInfo, DeliveryStatus, Message, VisitorInfo};
use super::status::ChatStatus;

/// The token bundle returned by the transport handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    /// Connection token for the live socket.
    pub connection_token: String,
    /// Remote participant identifier.
    pub participant_id: String,
    /// Participant-scoped credential.
    pub participant_token: String,
    /// Socket endpoint the transport is attached to.
    pub socket_url: String,
    /// Handshake completion timestamp (ISO 8601 format).
    pub start_time: String,
}

/// A support conversation and everything the presentation layer needs to
/// render it.
///
/// Invariant: a session is persisted only while `status != Closed`; the
/// storage layer drops the blob when asked to save a closed session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Conversation lifecycle stage.
    pub status: ChatStatus,
    /// Handshake token bundle, present from `Connected` onwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<SessionDetails>,
    /// Ordered conversation history. Appended on send or receipt; entries
    /// are mutated in place through delivery-status transitions and never
    /// removed except by an explicit history clear.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// The agent currently attached, replaced wholesale on each inbound
    /// status event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
    /// Visitor identity, set during initialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor: Option<VisitorInfo>,
    /// Messages received while the host had not marked the view as read.
    #[serde(default)]
    pub unread_count: u32,
    /// Mirror of the agent's typing indicator.
    #[serde(default)]
    pub is_typing: bool,
    /// Latest user-visible error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ChatError>,
}

impl ChatSession {
    /// Creates an empty session in `Closed` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the history.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Updates the delivery status of the message with the given id.
    ///
    /// Returns `false` when no message carries that id. Correlation is by
    /// id, never by position: there is no relative-ordering guarantee
    /// between an optimistic echo and any server-confirmed copy.
    pub fn set_delivery_status(&mut self, id: &str, status: DeliveryStatus) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.delivery_status = status;
                true
            }
            None => false,
        }
    }

    /// Records an inbound message and bumps the unread counter.
    pub fn receive_message(&mut self, message: Message) {
        self.messages.push(message);
        self.unread_count = self.unread_count.saturating_add(1);
    }

    /// Resets the unread counter. Idempotent.
    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    /// Replaces the agent record and mirrors its typing flag.
    pub fn set_agent(&mut self, agent: AgentInfo) {
        self.is_typing = agent.is_typing;
        self.agent = Some(agent);
    }
}

/// A finalized conversation transcript, persisted when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscript {
    pub session_id: String,
    /// Timestamp when the session ended (ISO 8601 format).
    pub ended_at: String,
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::Sender;

    #[test]
    fn test_set_delivery_status_by_id() {
        let mut session = ChatSession::new();
        let first = Message::outbound("one");
        let second = Message::outbound("two");
        let target = second.id.clone();
        session.push_message(first);
        session.push_message(second);

        assert!(session.set_delivery_status(&target, DeliveryStatus::Sent));
        assert_eq!(session.messages[0].delivery_status, DeliveryStatus::Sending);
        assert_eq!(session.messages[1].delivery_status, DeliveryStatus::Sent);
        assert!(!session.set_delivery_status("missing", DeliveryStatus::Failed));
    }

    #[test]
    fn test_receive_message_increments_unread() {
        let mut session = ChatSession::new();
        session.receive_message(Message::inbound(Sender::Agent, "hello"));
        session.receive_message(Message::inbound(Sender::Agent, "there"));
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.unread_count, 2);

        session.mark_read();
        session.mark_read();
        assert_eq!(session.unread_count, 0);
    }
}
