//! Error types for the Parley chat core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the chat core.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Note that this is the
/// *programmatic* error surface; the user-visible error record attached to a
/// chat session is [`crate::session::ChatError`].
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ParleyError {
    /// Transport-level failure (handshake, send, token refresh).
    #[error("Transport error: {0}")]
    Transport(String),

    /// An operation that requires a live session was called without one.
    #[error("No active chat session")]
    NoActiveSession,

    /// IO error (file system operations in storage backends)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// Data access error (storage backend layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is the missing-session rejection
    pub fn is_no_active_session(&self) -> bool {
        matches!(self, Self::NoActiveSession)
    }
}

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ParleyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;
