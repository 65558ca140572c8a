#![forbid(unsafe_code)]

//! Resize-epoch tracking and mouse grace windows.
//!
//! Right after a backend resize, or right after a full-screen program leaves
//! the alternate screen, the terminal widget's idea of where the cursor is
//! can be briefly wrong. A click in that window must not be turned into a
//! cursor move. [`ResizeGraceGuard`] answers "is it safe to treat this click
//! as a cursor placement?".
//!
//! # Invariants
//!
//! 1. Every epoch routed to the guard is stored and opens a
//!    [`RESIZE_GRACE`] window from receipt, including one lower than the
//!    stored epoch (the backend restarts its counter on reattach).
//! 3. An alt-screen exit opens an independent [`ALT_EXIT_GRACE`] window.

use core::time::Duration;

use tracing::debug;

/// Grace window after a resize epoch is received.
pub const RESIZE_GRACE: Duration = Duration::from_millis(100);

/// Grace window after leaving the alternate screen.
pub const ALT_EXIT_GRACE: Duration = Duration::from_millis(500);

/// How the host should treat the next mouse interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickMode {
    /// Direct cursor placement is allowed.
    Cursor,
    /// Treat the click as an alternate, non-cursor-moving interaction.
    NonCursor,
}

/// Outcome of [`ResizeGraceGuard::on_resize_epoch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUpdate {
    /// Same or newer epoch than the stored one (or the first).
    Accepted,
    /// Lower than the stored epoch; the backend counter restarted.
    Rewound { previous: u64 },
}

#[derive(Debug, Clone)]
pub struct ResizeGraceGuard {
    epoch: Option<u64>,
    grace_until: Option<Duration>,
    alt_exit_at: Option<Duration>,
    resize_grace: Duration,
    alt_exit_grace: Duration,
    alt_screen: bool,
}

impl Default for ResizeGraceGuard {
    fn default() -> Self {
        Self::new(RESIZE_GRACE, ALT_EXIT_GRACE)
    }
}

impl ResizeGraceGuard {
    #[must_use]
    pub fn new(resize_grace: Duration, alt_exit_grace: Duration) -> Self {
        Self {
            epoch: None,
            grace_until: None,
            alt_exit_at: None,
            resize_grace,
            alt_exit_grace,
            alt_screen: false,
        }
    }

    /// Record a resize epoch received at `now`.
    ///
    /// Session routing happens before this call.
    pub fn on_resize_epoch(&mut self, epoch: u64, now: Duration) -> EpochUpdate {
        let update = match self.epoch.replace(epoch) {
            Some(previous) if epoch < previous => {
                debug!(epoch, previous, "resize epoch rewound");
                EpochUpdate::Rewound { previous }
            }
            _ => EpochUpdate::Accepted,
        };
        self.grace_until = Some(now.saturating_add(self.resize_grace));
        update
    }

    /// Record that a full-screen program left the alternate screen.
    pub fn on_alt_screen_exit(&mut self, now: Duration) {
        self.alt_exit_at = Some(now);
        self.alt_screen = false;
    }

    /// Feed the current alt-screen state; a falling edge records an exit.
    ///
    /// Returns `true` when an exit was recorded.
    pub fn observe_alt_screen(&mut self, active: bool, now: Duration) -> bool {
        let was = std::mem::replace(&mut self.alt_screen, active);
        if was && !active {
            self.on_alt_screen_exit(now);
            true
        } else {
            false
        }
    }

    /// Whether the next click must be treated as non-cursor-moving.
    ///
    /// True when the viewport is scrolled above the live tail, inside the
    /// alt-exit grace window, or inside the resize grace window.
    #[must_use]
    pub fn should_force_non_cursor_mode(&self, viewport_y: u32, base_y: u32, now: Duration) -> bool {
        if viewport_y < base_y {
            return true;
        }
        if let Some(exit) = self.alt_exit_at
            && now.saturating_sub(exit) < self.alt_exit_grace
        {
            return true;
        }
        self.grace_until.is_some_and(|until| now < until)
    }

    #[must_use]
    pub fn click_mode(&self, viewport_y: u32, base_y: u32, now: Duration) -> ClickMode {
        if self.should_force_non_cursor_mode(viewport_y, base_y, now) {
            ClickMode::NonCursor
        } else {
            ClickMode::Cursor
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    #[must_use]
    pub const fn grace_until(&self) -> Option<Duration> {
        self.grace_until
    }

    #[must_use]
    pub const fn alt_exit_at(&self) -> Option<Duration> {
        self.alt_exit_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn idle_guard_allows_cursor_clicks() {
        let g = ResizeGraceGuard::default();
        assert_eq!(g.click_mode(10, 10, ms(0)), ClickMode::Cursor);
    }

    #[test]
    fn scrolled_back_viewport_forces_non_cursor() {
        let g = ResizeGraceGuard::default();
        assert!(g.should_force_non_cursor_mode(3, 10, ms(0)));
    }

    #[test]
    fn resize_epoch_opens_grace_window() {
        let mut g = ResizeGraceGuard::default();
        assert_eq!(g.on_resize_epoch(1, ms(1000)), EpochUpdate::Accepted);
        assert_eq!(g.epoch(), Some(1));
        assert_eq!(g.grace_until(), Some(ms(1100)));
        assert!(g.should_force_non_cursor_mode(0, 0, ms(1099)));
        assert!(!g.should_force_non_cursor_mode(0, 0, ms(1100)));
    }

    #[test]
    fn alt_exit_grace_boundary() {
        let mut g = ResizeGraceGuard::default();
        g.on_alt_screen_exit(ms(2000));
        assert!(g.should_force_non_cursor_mode(0, 0, ms(2499)));
        assert!(!g.should_force_non_cursor_mode(0, 0, ms(2500)));
    }

    #[test]
    fn rewound_epoch_still_opens_grace_window() {
        let mut g = ResizeGraceGuard::default();
        g.on_resize_epoch(5, ms(0));
        assert_eq!(
            g.on_resize_epoch(0, ms(500)),
            EpochUpdate::Rewound { previous: 5 }
        );
        assert_eq!(g.epoch(), Some(0));
        assert_eq!(g.grace_until(), Some(ms(600)));
        assert_eq!(g.click_mode(0, 0, ms(510)), ClickMode::NonCursor);
        assert_eq!(g.click_mode(0, 0, ms(600)), ClickMode::Cursor);
    }

    #[test]
    fn repeated_epoch_refreshes_grace() {
        let mut g = ResizeGraceGuard::default();
        g.on_resize_epoch(5, ms(0));
        assert_eq!(g.on_resize_epoch(5, ms(300)), EpochUpdate::Accepted);
        assert_eq!(g.grace_until(), Some(ms(400)));
    }

    #[test]
    fn alt_screen_falling_edge_records_exit() {
        let mut g = ResizeGraceGuard::default();
        assert!(!g.observe_alt_screen(false, ms(0)));
        assert!(!g.observe_alt_screen(true, ms(10)));
        assert!(!g.observe_alt_screen(true, ms(20)));
        assert!(g.observe_alt_screen(false, ms(30)));
        assert_eq!(g.alt_exit_at(), Some(ms(30)));
        assert!(!g.observe_alt_screen(false, ms(40)));
    }
}
