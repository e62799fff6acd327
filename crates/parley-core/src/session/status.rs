//! Lifecycle status enums.
//!
//! The chat status (conversation lifecycle) and the connection status
//! (transport link lifecycle) are deliberately separate enums: a transport
//! may be reconnecting while the conversation is still shown as live, and
//! an ended conversation keeps no connection at all.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    /// No conversation exists yet.
    #[default]
    Closed,
    /// A conversation is being set up (visitor details may still be needed).
    Initializing,
    /// Transport handshake in progress, waiting for an agent.
    Waiting,
    /// Conversation is live.
    Connected,
    /// Conversation finished; a new one starts from `Initializing`.
    Ended,
}

impl ChatStatus {
    /// Whether messages may be sent in this status.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether the session should be considered live for persistence
    /// bookkeeping (eligible for restore after a reload).
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Waiting | Self::Connected)
    }
}

/// Lifecycle stage of the underlying transport link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionStatus {
    /// Whether the link is usable for sending.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
