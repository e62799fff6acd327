//! Transport contract.
//!
//! Defines the interface the chat core expects from the underlying
//! bidirectional channel (e.g. a participant-service WebSocket bridge),
//! decoupling the lifecycle logic from any specific wire protocol.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::session::{SessionDetails, TransportEvent, VisitorInfo};

/// An abstract bidirectional channel used to exchange chat events with the
/// remote party.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Resolve `initialize_chat` only once the handshake completes
/// - Deliver inbound events through the broadcast channel returned by
///   `subscribe`
/// - Close their socket and stop delivering events when dropped; exactly one
///   transport instance may be live per controller, and re-initialization
///   disposes the previous one before creating the next
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the handshake and returns the session token bundle.
    async fn initialize_chat(&self, visitor: &VisitorInfo) -> Result<SessionDetails>;

    /// Sends a message, resolving once the remote side acknowledges it.
    async fn send_message(&self, content: &str) -> Result<()>;

    /// Gracefully closes the conversation on the remote side.
    async fn end_chat(&self) -> Result<()>;

    /// Forwards the visitor's typing indicator.
    async fn set_typing(&self, active: bool) -> Result<()>;

    /// Refreshes the connection token on the existing session, the cheap
    /// first step of a reconnect.
    async fn refresh_connection_token(&self) -> Result<()>;

    /// Subscribes to inbound events. Each call returns an independent
    /// receiver positioned at the current tail.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Transport")
    }
}

/// Factory for transport instances.
///
/// The connection layer creates a fresh transport per initialization run so
/// a failed or superseded connection never leaks listeners into the next.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Transport>;
}
