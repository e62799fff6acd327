//! Storage key constants.
//!
//! All Parley blobs share a common prefix so a host page embedding the
//! widget never collides with its own storage keys.

/// Serialized [`crate::session::ChatSession`] (omitted while closed).
pub const CHAT_STATE: &str = "parley.chat_state";

/// Serialized [`crate::session::VisitorInfo`].
pub const VISITOR_INFO: &str = "parley.visitor_info";

/// Bare session-id string, assigned once per browser session.
pub const SESSION_ID: &str = "parley.session_id";

/// Finalized [`crate::session::ChatTranscript`].
pub const CHAT_HISTORY: &str = "parley.chat_history";

/// Serialized [`crate::widget::WidgetPreferences`], kept separate from chat
/// data so a preference reset never disturbs a conversation.
pub const WIDGET_PREFERENCES: &str = "parley.widget_preferences";

/// Every key the store owns, in `clear_all` order.
pub const ALL: &[&str] = &[
    CHAT_STATE,
    VISITOR_INFO,
    SESSION_ID,
    CHAT_HISTORY,
    WIDGET_PREFERENCES,
];
