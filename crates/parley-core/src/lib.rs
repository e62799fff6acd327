//! Parley chat core.
//!
//! The session and connection lifecycle layer of the Parley support-chat
//! widget: chat status transitions, message delivery tracking, connection
//! health and reconnection policy, and cross-reload persistence. Rendering,
//! theming, and the concrete wire protocol live outside this crate and plug
//! in through the [`transport::Transport`] and [`storage::KeyValueStore`]
//! contracts.
//!
//! # Module Structure
//!
//! - `session`: domain models (`ChatSession`, `Message`, status enums)
//! - `chat`: the conversation state machine (`ChatSessionController`)
//! - `connection`: link health and reconnection (`ConnectionManager`)
//! - `storage`: persistence contracts and the best-effort `SessionStore`
//! - `widget`: panel presentation state and preferences
//! - `transport`: the abstract bidirectional channel contract
//! - `scheduler`: injectable timers
//! - `error`: the shared error type

pub mod chat;
pub mod connection;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod transport;
pub mod widget;

// Re-export common error type
pub use error::ParleyError;
