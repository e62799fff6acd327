//! Chat session lifecycle controller.
//!
//! [`ChatSessionController`] owns the conversation state machine
//! (`Closed -> Initializing -> Waiting -> Connected -> Ended`) and
//! orchestrates message delivery, typing indicators, unread counters, and
//! error surfacing on top of [`ConnectionManager`] and [`SessionStore`].
//!
//! All state lives in one logical [`ChatSession`] value mutated exclusively
//! through the serialized `update` path: apply the closure under the watch
//! channel's writer lock, notify subscribers with the committed snapshot,
//! then persist it. Interleaved async callbacks can therefore never produce
//! a torn state, and persistence stays decoupled from transition logic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::error::{ParleyError, Result};
use crate::scheduler::Scheduler;
use crate::session::{
    ChatError, ChatSession, ChatStatus, ChatTranscript, ConnectionStatus, DeliveryStatus, Message,
    SessionDetails, TransportEvent, VisitorDraft,
};
use crate::storage::SessionStore;
use crate::transport::Transport;

/// How long after the last keystroke the typing indicator is retracted.
const TYPING_STOP_DELAY: Duration = Duration::from_secs(3);

/// The event pump reading a transport's broadcast channel.
struct Pump {
    handle: JoinHandle<()>,
    transport: Arc<dyn Transport>,
}

struct ControllerInner {
    state_tx: watch::Sender<ChatSession>,
    store: SessionStore,
    connection: ConnectionManager,
    scheduler: Arc<dyn Scheduler>,
    pump: Mutex<Option<Pump>>,
    typing_timer: Mutex<Option<JoinHandle<()>>>,
    connection_watch: Mutex<Option<JoinHandle<()>>>,
}

/// What the presentation layer consumes each frame.
#[derive(Debug, Clone)]
pub struct ChatViewModel {
    pub chat: ChatSession,
    pub is_connected: bool,
    pub is_loading: bool,
}

/// Cheaply cloneable handle to the conversation state machine.
///
/// Must be used within a tokio runtime: the transport event pump and the
/// typing debounce are spawned tasks.
#[derive(Clone)]
pub struct ChatSessionController {
    inner: Arc<ControllerInner>,
}

impl ChatSessionController {
    pub fn new(
        store: SessionStore,
        connection: ConnectionManager,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(ChatSession::new());
        Self {
            inner: Arc::new(ControllerInner {
                state_tx,
                store,
                connection,
                scheduler,
                pump: Mutex::new(None),
                typing_timer: Mutex::new(None),
                connection_watch: Mutex::new(None),
            }),
        }
    }

    /// Runs the mount-time sequence: restore a still-active session from
    /// storage, then watch the connection so a recovered transport gets its
    /// events pumped again.
    pub async fn start(&self) {
        self.restore_from_storage().await;
        self.spawn_connection_watch();
    }

    /// Current committed snapshot.
    pub fn snapshot(&self) -> ChatSession {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribes to committed state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ChatSession> {
        self.inner.state_tx.subscribe()
    }

    /// Whether the transport link is usable.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.status().is_online()
    }

    /// Whether the conversation is between initiation and a live agent.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.snapshot().status,
            ChatStatus::Initializing | ChatStatus::Waiting
        )
    }

    /// The bundle the presentation layer renders from.
    pub fn view(&self) -> ChatViewModel {
        ChatViewModel {
            chat: self.snapshot(),
            is_connected: self.is_connected(),
            is_loading: self.is_loading(),
        }
    }

    /// Applies a previously persisted session, but only when the storage
    /// bookkeeping still considers it active. A conversation that ended
    /// normally cleared its session-id marker on the way out and must never
    /// reappear as live after a reload.
    pub async fn restore_from_storage(&self) {
        if !self.inner.store.has_active_session().await {
            return;
        }
        let Some(mut saved) = self.inner.store.load_chat_state().await else {
            return;
        };
        if let Some(visitor) = self.inner.store.load_visitor_info().await {
            saved.visitor = Some(visitor);
        }
        debug!(status = ?saved.status, "restoring session from storage");
        // Already persisted; bypass the persist-after-commit hook.
        self.inner.state_tx.send_replace(saved);
    }

    /// Starts a fresh conversation for the given visitor.
    ///
    /// The session id is reused from storage when one is still assigned to
    /// this browser session, else generated. On handshake success the
    /// conversation is `Connected` with its token bundle; on failure it is
    /// finalized to `Ended` with a recoverable `ConnectionLost` error and
    /// the failure is returned to the caller.
    ///
    /// There is no re-entrancy guard: a second call racing the first simply
    /// flows through the same serialized update path, and the later
    /// transport result wins.
    pub async fn initialize_chat(&self, draft: VisitorDraft) -> Result<SessionDetails> {
        let session_id = match self.inner.store.load_session_id().await {
            Some(id) => id,
            None => self.inner.store.generate_session_id().await,
        };
        let visitor = draft.into_visitor(session_id);
        self.inner.store.save_visitor_info(&visitor).await;

        let initial = visitor.clone();
        self.update(move |state| {
            *state = ChatSession {
                status: ChatStatus::Initializing,
                visitor: Some(initial),
                ..ChatSession::new()
            };
        })
        .await;
        self.update(|state| state.status = ChatStatus::Waiting).await;

        match self.inner.connection.initialize(visitor).await {
            Ok((transport, details)) => {
                self.attach_pump(&transport);
                let committed = details.clone();
                self.update(move |state| {
                    state.status = ChatStatus::Connected;
                    state.details = Some(committed);
                })
                .await;
                Ok(details)
            }
            Err(e) => {
                let error = ChatError::connection_lost(e.to_string());
                self.update(move |state| {
                    state.status = ChatStatus::Ended;
                    state.error = Some(error);
                })
                .await;
                Err(e)
            }
        }
    }

    /// Sends a message through the live transport.
    ///
    /// Requires a connected conversation; rejected otherwise with the state
    /// untouched. The message is appended optimistically in `Sending` state
    /// before the transport acknowledges, then resolved to `Sent` or
    /// `Failed`. A failed message stays in history so the visitor can see
    /// and retry it.
    pub async fn send_message(&self, content: impl Into<String>) -> Result<()> {
        if !self.snapshot().status.accepts_messages() {
            return Err(ParleyError::NoActiveSession);
        }
        let Some(transport) = self.inner.connection.transport() else {
            return Err(ParleyError::NoActiveSession);
        };

        let content = content.into();
        let message = Message::outbound(content.clone());
        let id = message.id.clone();
        self.update(move |state| state.push_message(message)).await;

        match transport.send_message(&content).await {
            Ok(()) => {
                let sent = id;
                self.update(move |state| {
                    state.set_delivery_status(&sent, DeliveryStatus::Sent);
                })
                .await;
                Ok(())
            }
            Err(e) => {
                let failed = id;
                let error = ChatError::message_send_failed(e.to_string());
                self.update(move |state| {
                    state.set_delivery_status(&failed, DeliveryStatus::Failed);
                    state.error = Some(error);
                })
                .await;
                Err(e)
            }
        }
    }

    /// Ends the conversation with a close-anyway policy.
    ///
    /// The graceful transport disconnect is attempted but its outcome is
    /// irrelevant to the local lifecycle: the session is always finalized to
    /// `Ended`, the transcript persisted, and the active-session marker
    /// cleared, so a flaky disconnect can never trap the UI in a
    /// non-terminal state. Reconnects are suppressed from here on.
    pub async fn end_chat(&self) -> Result<()> {
        let transport = self.inner.connection.transport();
        // Never auto-reconnect after a user-initiated end.
        self.inner.connection.shutdown();
        self.detach_pump();
        self.cancel_typing_timer();

        if let Some(transport) = transport {
            if let Err(e) = transport.end_chat().await {
                warn!(error = %e, "graceful disconnect failed, closing anyway");
            }
        }

        let snapshot = self.update(|state| state.status = ChatStatus::Ended).await;
        let transcript = ChatTranscript {
            session_id: snapshot
                .visitor
                .as_ref()
                .map(|v| v.session_id.clone())
                .unwrap_or_default(),
            ended_at: chrono::Utc::now().to_rfc3339(),
            messages: snapshot.messages,
        };
        self.inner.store.save_chat_history(&transcript).await;
        self.inner.store.clear_session_id().await;
        Ok(())
    }

    /// Resets the unread counter. Idempotent.
    pub async fn mark_messages_as_read(&self) {
        self.update(|state| state.mark_read()).await;
    }

    /// Forwards the visitor's typing indicator while connected; a silent
    /// no-op otherwise. An active indicator is retracted automatically after
    /// a debounce interval, and each call supersedes the pending retraction.
    pub async fn set_typing(&self, active: bool) {
        if !self.snapshot().status.accepts_messages() {
            return;
        }
        let Some(transport) = self.inner.connection.transport() else {
            return;
        };
        self.cancel_typing_timer();

        if let Err(e) = transport.set_typing(active).await {
            debug!(error = %e, "typing indicator dropped");
            return;
        }
        if active {
            let controller = self.clone();
            let handle = tokio::spawn(async move {
                controller.inner.scheduler.sleep(TYPING_STOP_DELAY).await;
                if let Some(transport) = controller.inner.connection.transport() {
                    if let Err(e) = transport.set_typing(false).await {
                        debug!(error = %e, "typing retraction dropped");
                    }
                }
            });
            *self.inner.typing_timer.lock().unwrap() = Some(handle);
        }
    }

    /// Applies an inbound transport event.
    pub async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::MessageReceived { message } => {
                self.update(move |state| state.receive_message(message)).await;
            }
            TransportEvent::AgentStatus { agent } => {
                self.update(move |state| state.set_agent(agent)).await;
            }
            TransportEvent::ConnectionStatus { status } => {
                self.apply_connection_status(status).await;
            }
        }
    }

    /// Tears the controller down: timers and pumps are aborted so a stale
    /// fire after unmount is a no-op, and the transport is disposed.
    pub fn shutdown(&self) {
        self.detach_pump();
        self.cancel_typing_timer();
        if let Some(watcher) = self.inner.connection_watch.lock().unwrap().take() {
            watcher.abort();
        }
        self.inner.connection.shutdown();
    }

    /// Maps a transport-reported link status onto the chat lifecycle and
    /// lets the connection manager react to unexpected closes.
    async fn apply_connection_status(&self, status: ConnectionStatus) {
        let mapped = match status {
            ConnectionStatus::Connected => ChatStatus::Connected,
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => ChatStatus::Waiting,
            ConnectionStatus::Disconnected | ConnectionStatus::Failed => ChatStatus::Ended,
        };
        self.update(move |state| state.status = mapped).await;
        if mapped == ChatStatus::Ended {
            self.inner.connection.handle_unexpected_close();
        }
    }

    /// The serialized update path: mutate, notify subscribers, persist the
    /// committed snapshot. Returns the snapshot.
    async fn update<F: FnOnce(&mut ChatSession)>(&self, f: F) -> ChatSession {
        self.inner.state_tx.send_modify(f);
        let snapshot = self.inner.state_tx.borrow().clone();
        self.inner.store.save_chat_state(&snapshot).await;
        snapshot
    }

    /// Starts (or re-targets) the event pump for the given transport.
    /// Idempotent for the same instance; a previous pump is aborted first so
    /// duplicate event delivery cannot occur.
    fn attach_pump(&self, transport: &Arc<dyn Transport>) {
        let mut slot = self.inner.pump.lock().unwrap();
        if let Some(pump) = slot.as_ref() {
            if Arc::ptr_eq(&pump.transport, transport) {
                return;
            }
        }
        if let Some(pump) = slot.take() {
            pump.handle.abort();
        }

        let mut events = transport.subscribe();
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => controller.handle_transport_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event pump lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *slot = Some(Pump {
            handle,
            transport: transport.clone(),
        });
    }

    fn detach_pump(&self) {
        if let Some(pump) = self.inner.pump.lock().unwrap().take() {
            pump.handle.abort();
        }
    }

    fn cancel_typing_timer(&self) {
        if let Some(timer) = self.inner.typing_timer.lock().unwrap().take() {
            timer.abort();
        }
    }

    /// Re-attaches the event pump whenever the connection manager swaps in a
    /// fresh transport after a successful reconnect.
    fn spawn_connection_watch(&self) {
        let mut status_rx = self.inner.connection.subscribe();
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = *status_rx.borrow_and_update();
                if status.is_online() {
                    if let Some(transport) = controller.inner.connection.transport() {
                        controller.attach_pump(&transport);
                    }
                }
            }
        });
        *self.inner.connection_watch.lock().unwrap() = Some(handle);
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        for slot in [&self.typing_timer, &self.connection_watch] {
            if let Ok(mut guard) = slot.lock() {
                if let Some(handle) = guard.take() {
                    handle.abort();
                }
            }
        }
        if let Ok(mut guard) = self.pump.lock() {
            if let Some(pump) = guard.take() {
                pump.handle.abort();
            }
        }
    }
}
