#![forbid(unsafe_code)]

//! Host-driven single-shot timer.
//!
//! There are no threads here: the host calls [`SingleShotTimer::poll`] on its
//! event-loop tick and the timer reports whether its deadline passed.
//!
//! # Invariants
//!
//! 1. At most one deadline is pending; [`arm`](SingleShotTimer::arm) always
//!    cancels the previous one first.
//! 2. Each arming fires at most once.
//! 3. [`cancel`](SingleShotTimer::cancel) on an idle timer is a no-op.

use core::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleShotTimer {
    deadline: Option<Duration>,
    /// Number of times the timer has been armed, for logs and tests.
    generation: u64,
}

impl SingleShotTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            generation: 0,
        }
    }

    /// Cancel any pending deadline and schedule a new one at `now + after`.
    pub fn arm(&mut self, now: Duration, after: Duration) {
        self.cancel();
        self.deadline = Some(now.saturating_add(after));
        self.generation += 1;
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` exactly once when `now` reaches the deadline.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
