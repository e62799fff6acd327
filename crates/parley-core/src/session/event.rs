//! Inbound transport events.

use serde::{Deserialize, Serialize};

use super::message::{AgentInfo, Message};
use super::status::ConnectionStatus;

/// Events the transport delivers to the chat layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// A message arrived from the remote party.
    MessageReceived { message: Message },
    /// The remote agent's presence or typing state changed.
    AgentStatus { agent: AgentInfo },
    /// The transport link's health changed.
    ConnectionStatus { status: ConnectionStatus },
}
