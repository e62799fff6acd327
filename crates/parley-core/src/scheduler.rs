//! Injectable timer abstraction.
//!
//! Reconnect delays and the typing-stop debounce go through this trait so
//! timing-sensitive logic is unit-testable with tokio's paused clock (or a
//! hand-rolled scheduler) instead of real timers.

use std::time::Duration;

use async_trait::async_trait;

/// Asynchronous sleep provider.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production scheduler backed by `tokio::time`.
///
/// Under `#[tokio::test(start_paused = true)]` these sleeps resolve via the
/// paused clock, which is how the connection tests drive reconnect timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
