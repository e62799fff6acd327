//! User-visible chat error records.
//!
//! Unlike [`crate::error::ParleyError`], which is the programmatic error
//! surface, a [`ChatError`] is a value stored on the session and shown to
//! the visitor. Each carries a code, a message, a timestamp, and whether the
//! condition is recoverable (e.g. by resending or reconnecting).

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Error taxonomy for user-visible chat failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatErrorCode {
    /// Initialization or reconnect failure.
    ConnectionLost,
    /// A single message failed to send; recoverable by resend.
    MessageSendFailed,
    /// The remote agent dropped off.
    AgentDisconnected,
    /// The session expired on the remote side.
    SessionTimeout,
    /// Credentials or participant token rejected.
    AuthenticationFailed,
    /// The remote side is throttling us.
    RateLimitExceeded,
}

impl ChatErrorCode {
    /// Default recoverability for the code.
    pub fn default_recoverable(&self) -> bool {
        match self {
            Self::ConnectionLost => true,
            Self::MessageSendFailed => true,
            Self::AgentDisconnected => true,
            Self::RateLimitExceeded => true,
            Self::SessionTimeout => false,
            Self::AuthenticationFailed => false,
        }
    }
}

/// A user-visible error attached to a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatError {
    pub code: ChatErrorCode,
    pub message: String,
    /// Timestamp when the error occurred (ISO 8601 format).
    pub timestamp: String,
    pub recoverable: bool,
}

impl ChatError {
    /// Creates an error with the code's default recoverability.
    pub fn new(code: ChatErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            recoverable: code.default_recoverable(),
        }
    }

    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::new(ChatErrorCode::ConnectionLost, message)
    }

    pub fn message_send_failed(message: impl Into<String>) -> Self {
        Self::new(ChatErrorCode::MessageSendFailed, message)
    }

    pub fn agent_disconnected(message: impl Into<String>) -> Self {
        Self::new(ChatErrorCode::AgentDisconnected, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_defaults() {
        assert!(ChatError::connection_lost("init failed").recoverable);
        assert!(ChatError::message_send_failed("send failed").recoverable);
        assert!(!ChatError::new(ChatErrorCode::AuthenticationFailed, "denied").recoverable);
        assert!(!ChatError::new(ChatErrorCode::SessionTimeout, "expired").recoverable);
    }
}
