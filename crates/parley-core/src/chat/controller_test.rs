use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::chat::ChatSessionController;
use crate::connection::{ConnectionManager, ReconnectPolicy};
use crate::error::{ParleyError, Result};
use crate::scheduler::TokioScheduler;
use crate::session::{
    AgentInfo, AgentPresence, ChatErrorCode, ChatStatus, ConnectionStatus, DeliveryStatus, Message,
    Sender, SessionDetails, TransportEvent, VisitorDraft, VisitorInfo,
};
use crate::storage::{KeyValueStore, SessionStore};
use crate::transport::{Transport, TransportFactory};

// In-memory key/value backend shared across controller generations to
// exercise cross-reload persistence.
#[derive(Default)]
struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

struct MockTransport {
    shared: Arc<Shared>,
}

// Knobs and counters shared between the factory, its transports, and the
// test body. The broadcast sender doubles as the remote party: tests push
// inbound events through it.
struct Shared {
    events: broadcast::Sender<TransportEvent>,
    fail_initialize: AtomicBool,
    fail_send: AtomicBool,
    fail_end: AtomicBool,
    send_calls: AtomicUsize,
    end_calls: AtomicUsize,
    typing_calls: Mutex<Vec<bool>>,
}

impl Default for Shared {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            fail_initialize: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            fail_end: AtomicBool::new(false),
            send_calls: AtomicUsize::new(0),
            end_calls: AtomicUsize::new(0),
            typing_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn initialize_chat(&self, _visitor: &VisitorInfo) -> Result<SessionDetails> {
        if self.shared.fail_initialize.load(Ordering::SeqCst) {
            return Err(ParleyError::transport("handshake refused"));
        }
        Ok(SessionDetails {
            connection_token: "t1".to_string(),
            participant_id: "p1".to_string(),
            participant_token: "pt1".to_string(),
            socket_url: "wss://example.test/socket".to_string(),
            start_time: chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn send_message(&self, _content: &str) -> Result<()> {
        self.shared.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_send.load(Ordering::SeqCst) {
            return Err(ParleyError::transport("socket write failed"));
        }
        Ok(())
    }

    async fn end_chat(&self) -> Result<()> {
        self.shared.end_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_end.load(Ordering::SeqCst) {
            return Err(ParleyError::transport("disconnect refused"));
        }
        Ok(())
    }

    async fn set_typing(&self, active: bool) -> Result<()> {
        self.shared.typing_calls.lock().unwrap().push(active);
        Ok(())
    }

    async fn refresh_connection_token(&self) -> Result<()> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.shared.events.subscribe()
    }
}

#[derive(Clone, Default)]
struct MockFactory {
    shared: Arc<Shared>,
}

impl TransportFactory for MockFactory {
    fn create(&self) -> Arc<dyn Transport> {
        Arc::new(MockTransport {
            shared: self.shared.clone(),
        })
    }
}

struct Fixture {
    controller: ChatSessionController,
    shared: Arc<Shared>,
    backend: Arc<MemoryBackend>,
}

fn fixture() -> Fixture {
    fixture_on(Arc::new(MemoryBackend::default()))
}

fn fixture_on(backend: Arc<MemoryBackend>) -> Fixture {
    let factory = MockFactory::default();
    let shared = factory.shared.clone();
    let store = SessionStore::new(backend.clone());
    let connection = ConnectionManager::new(
        Arc::new(factory),
        Arc::new(TokioScheduler),
        ReconnectPolicy::fixed(Duration::from_secs(2)),
    );
    let controller = ChatSessionController::new(store, connection, Arc::new(TokioScheduler));
    Fixture {
        controller,
        shared,
        backend,
    }
}

async fn settle() {
    // Let the event pump drain its channel.
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_initialize_success() {
    let fx = fixture();
    let details = fx
        .controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    assert_eq!(details.connection_token, "t1");
    let state = fx.controller.snapshot();
    assert_eq!(state.status, ChatStatus::Connected);
    assert_eq!(state.visitor.as_ref().unwrap().name, "Ann");
    assert_eq!(
        state.details.as_ref().unwrap().connection_token,
        "t1"
    );
    assert!(fx.controller.is_connected());
    assert!(!fx.controller.is_loading());
}

#[tokio::test]
async fn test_initialize_failure_finalizes_with_recoverable_error() {
    let fx = fixture();
    fx.shared.fail_initialize.store(true, Ordering::SeqCst);

    let err = fx
        .controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap_err();
    assert!(err.is_transport());

    let state = fx.controller.snapshot();
    assert_eq!(state.status, ChatStatus::Ended);
    let error = state.error.unwrap();
    assert_eq!(error.code, ChatErrorCode::ConnectionLost);
    assert!(error.recoverable);
}

#[tokio::test]
async fn test_send_rejected_outside_connected() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    // Transport drops back to connecting; chat maps onto waiting.
    fx.shared
        .events
        .send(TransportEvent::ConnectionStatus {
            status: ConnectionStatus::Connecting,
        })
        .unwrap();
    settle().await;
    assert_eq!(fx.controller.snapshot().status, ChatStatus::Waiting);

    let before = fx.controller.snapshot().messages.len();
    let err = fx.controller.send_message("hi").await.unwrap_err();
    assert!(err.is_no_active_session());
    assert_eq!(err.to_string(), "No active chat session");
    assert_eq!(fx.controller.snapshot().messages.len(), before);
}

#[tokio::test]
async fn test_send_count_matches_call_count_and_none_stuck_sending() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    fx.controller.send_message("one").await.unwrap();
    fx.controller.send_message("two").await.unwrap();
    fx.shared.fail_send.store(true, Ordering::SeqCst);
    let _ = fx.controller.send_message("three").await.unwrap_err();

    let state = fx.controller.snapshot();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(fx.shared.send_calls.load(Ordering::SeqCst), 3);
    for message in &state.messages {
        assert_ne!(message.delivery_status, DeliveryStatus::Sending);
    }
    assert_eq!(state.messages[0].delivery_status, DeliveryStatus::Sent);
    assert_eq!(state.messages[2].delivery_status, DeliveryStatus::Failed);
    // Ids are distinct per call
    assert_ne!(state.messages[0].id, state.messages[1].id);
}

#[tokio::test]
async fn test_failed_message_retained_and_error_surfaced() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    fx.shared.fail_send.store(true, Ordering::SeqCst);
    let err = fx.controller.send_message("hi").await.unwrap_err();
    assert!(err.is_transport());

    let state = fx.controller.snapshot();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].delivery_status, DeliveryStatus::Failed);
    assert_eq!(
        state.error.unwrap().code,
        ChatErrorCode::MessageSendFailed
    );
}

#[tokio::test]
async fn test_inbound_message_increments_unread() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    fx.shared
        .events
        .send(TransportEvent::MessageReceived {
            message: Message::inbound(Sender::Agent, "hello"),
        })
        .unwrap();
    settle().await;

    let state = fx.controller.snapshot();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.unread_count, 1);

    fx.controller.mark_messages_as_read().await;
    fx.controller.mark_messages_as_read().await;
    assert_eq!(fx.controller.snapshot().unread_count, 0);
}

#[tokio::test]
async fn test_agent_status_replaces_agent_and_mirrors_typing() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    fx.shared
        .events
        .send(TransportEvent::AgentStatus {
            agent: AgentInfo {
                id: "a1".to_string(),
                name: "Sam".to_string(),
                profile_image: None,
                presence: AgentPresence::Online,
                is_typing: true,
            },
        })
        .unwrap();
    settle().await;

    let state = fx.controller.snapshot();
    assert_eq!(state.agent.as_ref().unwrap().name, "Sam");
    assert!(state.is_typing);
}

#[tokio::test]
async fn test_end_chat_closes_anyway_when_disconnect_fails() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();
    fx.controller.send_message("bye").await.unwrap();

    fx.shared.fail_end.store(true, Ordering::SeqCst);
    fx.controller.end_chat().await.unwrap();
    assert_eq!(fx.shared.end_calls.load(Ordering::SeqCst), 1);

    let state = fx.controller.snapshot();
    assert_eq!(state.status, ChatStatus::Ended);

    // Transcript persisted and active-session marker cleared
    let store = SessionStore::new(fx.backend.clone());
    let transcript = store.load_chat_history().await.unwrap();
    assert_eq!(transcript.messages.len(), 1);
    assert!(!store.has_active_session().await);
}

#[tokio::test]
async fn test_restore_applies_only_active_sessions() {
    let backend = Arc::new(MemoryBackend::default());
    let fx = fixture_on(backend.clone());
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    // Simulated reload while the session is still live
    let reloaded = fixture_on(backend.clone());
    reloaded.controller.restore_from_storage().await;
    let state = reloaded.controller.snapshot();
    assert_eq!(state.status, ChatStatus::Connected);
    assert_eq!(state.visitor.as_ref().unwrap().name, "Ann");

    // Normal end, then another reload: nothing may resurrect
    reloaded.controller.end_chat().await.unwrap();
    let after_end = fixture_on(backend);
    after_end.controller.restore_from_storage().await;
    assert_eq!(after_end.controller.snapshot().status, ChatStatus::Closed);
}

#[tokio::test]
async fn test_session_id_reused_across_runs() {
    let backend = Arc::new(MemoryBackend::default());
    let fx = fixture_on(backend.clone());
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();
    let first = fx.controller.snapshot().visitor.unwrap().session_id;

    // Transport failure ends the run but keeps the browser-session id
    fx.shared.fail_initialize.store(true, Ordering::SeqCst);
    let _ = fx
        .controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap_err();
    let second = fx.controller.snapshot().visitor.unwrap().session_id;
    assert_eq!(first, second);

    // An explicit end clears the id; the next run generates a fresh one
    fx.shared.fail_initialize.store(false, Ordering::SeqCst);
    fx.controller.end_chat().await.unwrap();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();
    let third = fx.controller.snapshot().visitor.unwrap().session_id;
    assert_ne!(first, third);
}

#[tokio::test(start_paused = true)]
async fn test_typing_indicator_debounced() {
    let fx = fixture();
    fx.controller
        .initialize_chat(VisitorDraft::new("Ann"))
        .await
        .unwrap();

    fx.controller.set_typing(true).await;
    tokio::time::sleep(Duration::from_secs(4)).await;

    let calls = fx.shared.typing_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![true, false]);
}

#[tokio::test]
async fn test_typing_is_noop_without_session() {
    let fx = fixture();
    // Never errors, never reaches a transport
    fx.controller.set_typing(true).await;
    assert!(fx.shared.typing_calls.lock().unwrap().is_empty());
}
