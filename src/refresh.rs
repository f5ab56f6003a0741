//! Coalescing refresh scheduler.
//!
//! Any number of `schedule` calls inside one window collapse into a single
//! refresh at `first call + delay`. The consumer polls `take_due` from its
//! own loop; the pending flag is cleared before the refresh runs, so a
//! schedule made during the refresh opens the next window.

use std::time::{Duration, Instant};

/// Coalescing delay used when no config overrides it.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_DELAY)
    }
}

impl RefreshScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a refresh unless one is already pending. Returns true if
    /// this call opened a new window.
    pub fn schedule(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the pending refresh is due; clears it.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
