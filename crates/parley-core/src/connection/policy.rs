//! Reconnect timing policy.

use std::time::Duration;

/// Delay before a scheduled reconnect attempt fires.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Policy object deciding how long to wait before a reconnect attempt.
///
/// The delay is a fixed constant regardless of the attempt count; the
/// widget schedules at most one attempt per trigger and a new trigger
/// supersedes a pending one, so there is no growth to bound. The attempt
/// counter is still threaded through for logging and so an alternative
/// delay curve can be dropped in without touching the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    /// A policy with a fixed delay between trigger and attempt.
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before the given (1-based) attempt.
    pub fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}
