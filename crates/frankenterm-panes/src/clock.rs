#![forbid(unsafe_code)]

//! Monotonic time sources for grace windows and gesture timers.
//!
//! Every time-based decision in this crate reads a [`Clock`] instead of the
//! wall clock, so hosts (and tests) can drive time explicitly.

use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

use web_time::Instant;

/// Monotonic clock measured from an arbitrary host-defined origin.
pub trait Clock {
    /// Current monotonic time.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
///
/// Cloning yields another handle to the same time cell, so the deck and
/// every mounted pane observe the same "now".
#[derive(Debug, Default, Clone)]
pub struct HostClock {
    now: Rc<Cell<Duration>>,
}

impl HostClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current monotonic time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }

    /// Advance by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for HostClock {
    fn now_mono(&self) -> Duration {
        self.now.get()
    }
}

/// Real monotonic clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_clock_starts_at_zero() {
        assert_eq!(HostClock::new().now_mono(), Duration::ZERO);
    }

    #[test]
    fn clones_share_time() {
        let a = HostClock::new();
        let b = a.clone();
        a.advance_ms(250);
        assert_eq!(b.now_mono(), Duration::from_millis(250));
        b.set(Duration::from_secs(3));
        assert_eq!(a.now_mono(), Duration::from_secs(3));
    }

    #[test]
    fn advance_saturates() {
        let clock = HostClock::new();
        clock.set(Duration::MAX);
        clock.advance_ms(1);
        assert_eq!(clock.now_mono(), Duration::MAX);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_mono();
        let b = clock.now_mono();
        assert!(b >= a);
    }
}
