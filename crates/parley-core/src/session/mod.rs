//! Session domain module.
//!
//! This module contains all conversation-related domain models.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`ChatSession`, `SessionDetails`,
//!   `ChatTranscript`)
//! - `message`: Message and participant types (`Message`, `AgentInfo`,
//!   `VisitorInfo`)
//! - `status`: Lifecycle enums (`ChatStatus`, `ConnectionStatus`)
//! - `event`: Inbound transport events (`TransportEvent`)
//! - `chat_error`: User-visible error records (`ChatError`)

mod chat_error;
mod event;
mod message;
mod model;
mod status;

// Re-export public API
pub use chat_error::{ChatError, ChatErrorCode};
pub use event::TransportEvent;
pub use message::{
    AgentInfo, AgentPresence, DeliveryStatus, Message, MessageKind, Sender, VisitorDraft,
    VisitorInfo,
};
pub use model::{ChatSession, ChatTranscript, SessionDetails};
pub use status::{ChatStatus, ConnectionStatus};
