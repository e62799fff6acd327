//! Connection health management.
//!
//! [`ConnectionManager`] owns the transport handle and the link's health
//! state. It reacts to unexpected transport closes, browser online/offline
//! reports, and page-visibility changes, and it schedules reconnect
//! attempts so that at most one timer or attempt is ever in flight: any new
//! trigger supersedes a pending one rather than stacking.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::policy::ReconnectPolicy;
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::session::{ConnectionStatus, SessionDetails, VisitorInfo};
use crate::transport::{Transport, TransportFactory};

/// Mutable connection state behind the handle.
struct ConnState {
    /// The live transport, at most one per manager.
    transport: Option<Arc<dyn Transport>>,
    /// Last known configuration, used for full-handshake fallback.
    visitor: Option<VisitorInfo>,
    /// The single in-flight reconnect timer, superseded on new triggers.
    pending: Option<JoinHandle<()>>,
    /// Reconnect attempt counter since the last successful connection.
    attempts: u32,
    /// Last network state the host reported.
    online: bool,
    /// Set by `shutdown`; suppresses reconnects after a user-initiated end.
    halted: bool,
}

struct ManagerInner {
    factory: Arc<dyn TransportFactory>,
    scheduler: Arc<dyn Scheduler>,
    policy: ReconnectPolicy,
    status_tx: watch::Sender<ConnectionStatus>,
    state: Mutex<ConnState>,
}

/// Cheaply cloneable handle to the connection state machine.
///
/// Must be used within a tokio runtime: reconnect timers are spawned tasks.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ConnectionManager {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        scheduler: Arc<dyn Scheduler>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (status_tx, _status_rx) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(ManagerInner {
                factory,
                scheduler,
                policy,
                status_tx,
                state: Mutex::new(ConnState {
                    transport: None,
                    visitor: None,
                    pending: None,
                    attempts: 0,
                    online: true,
                    halted: false,
                }),
            }),
        }
    }

    /// Current link status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Subscribes to link status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// The live transport, if one exists.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.state.lock().unwrap().transport.clone()
    }

    /// Establishes a fresh connection with the given configuration.
    ///
    /// Any previous transport is disposed and any pending reconnect timer
    /// cancelled before the new handshake starts, so duplicate connections
    /// or duplicate event delivery cannot occur. A handshake failure is both
    /// recorded as `Failed` and returned to the caller.
    pub async fn initialize(
        &self,
        visitor: VisitorInfo,
    ) -> Result<(Arc<dyn Transport>, SessionDetails)> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(timer) = state.pending.take() {
                timer.abort();
            }
            state.transport = None;
            state.visitor = Some(visitor.clone());
            state.halted = false;
        }
        self.set_status(ConnectionStatus::Connecting);

        let transport = self.inner.factory.create();
        match transport.initialize_chat(&visitor).await {
            Ok(details) => {
                {
                    let mut state = self.inner.state.lock().unwrap();
                    state.transport = Some(transport.clone());
                    state.attempts = 0;
                }
                self.set_status(ConnectionStatus::Connected);
                Ok((transport, details))
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Failed);
                Err(e)
            }
        }
    }

    /// Reacts to an unexpected transport close: the link is marked
    /// disconnected and exactly one reconnect attempt is scheduled.
    pub fn handle_unexpected_close(&self) {
        if self.inner.state.lock().unwrap().halted {
            return;
        }
        self.set_status(ConnectionStatus::Disconnected);
        self.schedule_reconnect();
    }

    /// Applies a network state report from the host.
    ///
    /// Going offline forces `Disconnected` immediately, regardless of what
    /// the transport reports, and cancels any pending attempt. Coming back
    /// online while disconnected triggers a (superseding) reconnect.
    pub fn set_network_online(&self, online: bool) {
        let halted;
        {
            let mut state = self.inner.state.lock().unwrap();
            state.online = online;
            halted = state.halted;
            if !online {
                if let Some(timer) = state.pending.take() {
                    timer.abort();
                }
            }
        }
        if !online {
            self.set_status(ConnectionStatus::Disconnected);
        } else if !halted && self.status() == ConnectionStatus::Disconnected {
            self.schedule_reconnect();
        }
    }

    /// Applies a page-visibility report from the host. Becoming visible
    /// while disconnected triggers a (superseding) reconnect.
    pub fn set_page_visible(&self, visible: bool) {
        if visible && self.status() == ConnectionStatus::Disconnected {
            self.schedule_reconnect();
        }
    }

    /// Cancels any pending reconnect and disposes the transport.
    ///
    /// Used on user-initiated end and on controller teardown; reconnects
    /// are suppressed until the next `initialize`.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            state.halted = true;
            if let Some(timer) = state.pending.take() {
                timer.abort();
            }
            state.transport = None;
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Arms the reconnect timer, superseding a pending one.
    fn schedule_reconnect(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.halted || !state.online {
            return;
        }
        if let Some(timer) = state.pending.take() {
            timer.abort();
        }
        state.attempts += 1;
        let attempt = state.attempts;
        let delay = self.inner.policy.delay_for(attempt);
        debug!(attempt, ?delay, "reconnect scheduled");

        let manager = self.clone();
        state.pending = Some(tokio::spawn(async move {
            manager.inner.scheduler.sleep(delay).await;
            manager.attempt_reconnect(attempt).await;
        }));
    }

    /// Runs one reconnect attempt: token refresh first, full handshake with
    /// the last known configuration as fallback, `Failed` if both fail.
    /// Failures here are non-fatal; the caller may trigger again.
    async fn attempt_reconnect(&self, attempt: u32) {
        let (transport, visitor) = {
            let mut state = self.inner.state.lock().unwrap();
            state.pending = None;
            if state.halted || !state.online {
                return;
            }
            (state.transport.clone(), state.visitor.clone())
        };
        // A stale timer that outlived its trigger must be a no-op.
        if self.status() != ConnectionStatus::Disconnected {
            return;
        }
        self.set_status(ConnectionStatus::Reconnecting);

        if let Some(transport) = &transport {
            match transport.refresh_connection_token().await {
                Ok(()) => {
                    self.inner.state.lock().unwrap().attempts = 0;
                    self.set_status(ConnectionStatus::Connected);
                    debug!(attempt, "reconnected via token refresh");
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "token refresh failed, falling back to full handshake");
                }
            }
        }

        let Some(visitor) = visitor else {
            warn!(attempt, "no configuration available for reconnect");
            self.set_status(ConnectionStatus::Failed);
            return;
        };
        let transport = self.inner.factory.create();
        match transport.initialize_chat(&visitor).await {
            Ok(_details) => {
                {
                    let mut state = self.inner.state.lock().unwrap();
                    state.transport = Some(transport);
                    state.attempts = 0;
                }
                self.set_status(ConnectionStatus::Connected);
                debug!(attempt, "reconnected via full handshake");
            }
            Err(e) => {
                warn!(attempt, error = %e, "reconnect failed");
                self.set_status(ConnectionStatus::Failed);
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.inner.status_tx.send_replace(status);
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(timer) = state.pending.take() {
                timer.abort();
            }
        }
    }
}
