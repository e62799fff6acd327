//! Best-effort session persistence.
//!
//! [`SessionStore`] owns the cross-reload bookkeeping for the widget: the
//! serialized chat state, the visitor identity, the browser-session id, the
//! finalized transcript, and the widget preferences. Persistence is
//! best-effort and never load-bearing for correctness: every failure is
//! logged and swallowed, reads degrade to `None`, and the rest of the
//! system carries on.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::keys;
use super::kv::KeyValueStore;
use crate::session::{ChatSession, ChatTranscript, VisitorInfo};
use crate::widget::WidgetPreferences;

/// Length of the random suffix appended to generated session ids.
const SESSION_ID_SUFFIX_LEN: usize = 9;

/// Persists and restores widget state over an abstract key/value backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Saves the chat state blob.
    ///
    /// A closed session is not persisted: saving one removes any existing
    /// blob instead, upholding the `status != Closed` invariant.
    pub async fn save_chat_state(&self, session: &ChatSession) {
        use crate::session::ChatStatus;

        if session.status == ChatStatus::Closed {
            self.discard(keys::CHAT_STATE).await;
        } else {
            self.put(keys::CHAT_STATE, session).await;
        }
    }

    /// Loads the chat state blob, if one is stored and deserializable.
    pub async fn load_chat_state(&self) -> Option<ChatSession> {
        self.fetch(keys::CHAT_STATE).await
    }

    pub async fn save_visitor_info(&self, visitor: &VisitorInfo) {
        self.put(keys::VISITOR_INFO, visitor).await;
    }

    pub async fn load_visitor_info(&self) -> Option<VisitorInfo> {
        self.fetch(keys::VISITOR_INFO).await
    }

    /// Generates, persists, and returns a fresh session id.
    ///
    /// The id is a millisecond timestamp plus a random alphanumeric suffix,
    /// which makes collisions improbable without coordinating anything.
    pub async fn generate_session_id(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_SUFFIX_LEN)
            .map(char::from)
            .collect();
        let id = format!("{}-{}", Utc::now().timestamp_millis(), suffix);

        if let Err(e) = self.backend.set(keys::SESSION_ID, &id).await {
            warn!(key = keys::SESSION_ID, error = %e, "failed to persist session id");
        }
        id
    }

    /// Loads the session id assigned to this browser session, if any.
    pub async fn load_session_id(&self) -> Option<String> {
        match self.backend.get(keys::SESSION_ID).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = keys::SESSION_ID, error = %e, "failed to load session id");
                None
            }
        }
    }

    /// Clears the session-id marker, making the session inactive.
    pub async fn clear_session_id(&self) {
        self.discard(keys::SESSION_ID).await;
    }

    /// The sole gate for rehydration after a reload.
    ///
    /// True only when a session id is still assigned *and* the persisted
    /// state is in a live status. A session that ended normally clears its
    /// id on the way out, so it can never resurrect as connected.
    pub async fn has_active_session(&self) -> bool {
        if self.load_session_id().await.is_none() {
            return false;
        }
        match self.load_chat_state().await {
            Some(state) => state.status.is_live(),
            None => false,
        }
    }

    /// Persists a finalized transcript.
    pub async fn save_chat_history(&self, transcript: &ChatTranscript) {
        self.put(keys::CHAT_HISTORY, transcript).await;
    }

    /// Loads the most recently finalized transcript, if any.
    pub async fn load_chat_history(&self) -> Option<ChatTranscript> {
        self.fetch(keys::CHAT_HISTORY).await
    }

    /// Persists widget preferences, separately from chat-session data.
    pub async fn save_preferences(&self, preferences: &WidgetPreferences) {
        self.put(keys::WIDGET_PREFERENCES, preferences).await;
    }

    pub async fn load_preferences(&self) -> Option<WidgetPreferences> {
        self.fetch(keys::WIDGET_PREFERENCES).await
    }

    /// Removes every blob the store owns.
    pub async fn clear_all(&self) {
        for key in keys::ALL {
            self.discard(key).await;
        }
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize blob");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &json).await {
            warn!(key, error = %e, "failed to persist blob");
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = match self.backend.get(key).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to load blob");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "failed to deserialize blob, treating as absent");
                None
            }
        }
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            warn!(key, error = %e, "failed to remove blob");
        }
    }
}
