//! Widget presentation state and preferences.
//!
//! Open/minimized/closed is orthogonal to chat status: closing the panel
//! does not end a conversation, and an ended conversation can sit behind an
//! open panel. Preferences are persisted separately from chat-session data
//! so a preference reset never disturbs an in-progress conversation.

use serde::{Deserialize, Serialize};

use crate::session::{ChatStatus, VisitorInfo};
use crate::storage::SessionStore;

/// Presentation state of the widget panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetView {
    #[default]
    Closed,
    Open,
    Minimized,
}

/// Screen corner the launcher is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

/// User preferences, persisted across reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPreferences {
    #[serde(default)]
    pub position: WidgetPosition,
    #[serde(default = "default_sound")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub minimized: bool,
}

fn default_sound() -> bool {
    true
}

impl Default for WidgetPreferences {
    fn default() -> Self {
        Self {
            position: WidgetPosition::default(),
            sound_enabled: true,
            minimized: false,
        }
    }
}

/// Widget presentation state machine.
pub struct WidgetUiState {
    view: WidgetView,
    preferences: WidgetPreferences,
    store: SessionStore,
}

impl WidgetUiState {
    /// Creates the UI state with stored preferences applied. The panel
    /// always starts closed; a persisted `minimized` flag only takes effect
    /// once the visitor opens it again.
    pub async fn load(store: SessionStore) -> Self {
        let preferences = store.load_preferences().await.unwrap_or_default();
        Self {
            view: WidgetView::Closed,
            preferences,
            store,
        }
    }

    pub fn view(&self) -> WidgetView {
        self.view
    }

    pub fn preferences(&self) -> &WidgetPreferences {
        &self.preferences
    }

    pub async fn open_widget(&mut self) {
        self.view = WidgetView::Open;
        if self.preferences.minimized {
            self.preferences.minimized = false;
            self.persist().await;
        }
    }

    pub async fn close_widget(&mut self) {
        self.view = WidgetView::Closed;
    }

    pub async fn minimize_widget(&mut self) {
        self.view = WidgetView::Minimized;
        self.preferences.minimized = true;
        self.persist().await;
    }

    /// Closed -> open, open -> closed, minimized -> open.
    pub async fn toggle_widget(&mut self) {
        match self.view {
            WidgetView::Closed => self.open_widget().await,
            WidgetView::Open => self.close_widget().await,
            WidgetView::Minimized => self.open_widget().await,
        }
    }

    pub async fn set_position(&mut self, position: WidgetPosition) {
        self.preferences.position = position;
        self.persist().await;
    }

    pub async fn set_sound_enabled(&mut self, enabled: bool) {
        self.preferences.sound_enabled = enabled;
        self.persist().await;
    }

    /// Visitor gating: while the panel is open, nobody is identified, and
    /// the chat is initializing, the host must collect visitor details
    /// before the controller may proceed to `Waiting`.
    pub fn needs_visitor_details(
        &self,
        status: ChatStatus,
        visitor: Option<&VisitorInfo>,
    ) -> bool {
        self.view == WidgetView::Open
            && visitor.is_none()
            && status == ChatStatus::Initializing
    }

    async fn persist(&self) {
        self.store.save_preferences(&self.preferences).await;
    }
}
