#![forbid(unsafe_code)]

//! Wheel delta normalization and accumulation into discrete line scrolls.
//!
//! # Design
//!
//! - [`normalize_delta`] converts pixel/line/page wheel deltas into pixels.
//! - [`ScrollAccumulator`] banks sub-line pixels and emits whole line counts,
//!   at most [`MAX_LINES_PER_EVENT`] per call.
//! - [`GestureBoundaryTimer`] marks the end of a gesture after a quiet
//!   period so a leftover remainder never bleeds into the next gesture.
//! - [`WheelScroller`] is the per-pane bundle the host feeds.
//!
//! # Invariants
//!
//! 1. After every [`ScrollAccumulator::accumulate`], `|value| < threshold`.
//! 2. Line counts truncate toward zero, so opposite deltas of equal size
//!    cancel out.
//! 3. No scroll debt: magnitude beyond the per-event cap is discarded, not
//!    queued. Inertial sources keep delivering events on their own.

use core::time::Duration;

use tracing::trace;

use crate::input::{DeltaMode, WheelInput};
use crate::timer::SingleShotTimer;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixels per line for `DeltaMode::Line` wheel events.
pub const PIXELS_PER_LINE: f64 = 20.0;

/// Pixels per page for `DeltaMode::Page` wheel events.
pub const PIXELS_PER_PAGE: f64 = 800.0;

/// Pixels needed for one line scroll at 100% speed.
pub const BASE_THRESHOLD_PX: f64 = 60.0;

/// Upper bound on lines emitted by a single `accumulate` call.
pub const MAX_LINES_PER_EVENT: i32 = 5;

pub const MIN_SCROLL_SPEED: f64 = 50.0;
pub const MAX_SCROLL_SPEED: f64 = 250.0;
pub const DEFAULT_SCROLL_SPEED: f64 = 100.0;

/// Quiet period after which the next wheel event starts a new gesture.
pub const GESTURE_IDLE_TIMEOUT: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Convert a raw wheel delta into pixels.
#[must_use]
pub fn normalize_delta(raw_delta: f64, mode: DeltaMode) -> f64 {
    match mode {
        DeltaMode::Pixel => raw_delta,
        DeltaMode::Line => raw_delta * PIXELS_PER_LINE,
        DeltaMode::Page => raw_delta * PIXELS_PER_PAGE,
    }
}

/// Clamp a scroll speed percentage into `[50, 250]`. NaN maps to the default.
#[must_use]
pub fn clamp_scroll_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return DEFAULT_SCROLL_SPEED;
    }
    speed.clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED)
}

/// Pixels per emitted line for a scroll speed percentage.
///
/// `threshold(100) == 60`, `threshold(50) == 120`, `threshold(200) == 30`.
#[must_use]
pub fn threshold_for_speed(speed: f64) -> f64 {
    BASE_THRESHOLD_PX / (clamp_scroll_speed(speed) / 100.0)
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Per-pane sub-line pixel bank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAccumulator {
    value: f64,
    threshold_px: f64,
}

impl Default for ScrollAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_SPEED)
    }
}

impl ScrollAccumulator {
    #[must_use]
    pub fn new(scroll_speed: f64) -> Self {
        Self {
            value: 0.0,
            threshold_px: threshold_for_speed(scroll_speed),
        }
    }

    /// Add `pixels` and return the signed number of whole lines to scroll.
    ///
    /// Non-finite input is dropped and yields `0`.
    pub fn accumulate(&mut self, pixels: f64) -> i32 {
        if !pixels.is_finite() {
            return 0;
        }
        self.value += pixels;
        // f64 `%` is exact and sign-preserving; the count is derived from it.
        let remainder = self.value % self.threshold_px;
        let raw = ((self.value - remainder) / self.threshold_px).round();
        let max = f64::from(MAX_LINES_PER_EVENT);
        self.value = remainder;
        raw.clamp(-max, max) as i32
    }

    /// Current sub-line remainder in pixels.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn threshold_px(&self) -> f64 {
        self.threshold_px
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Change speed mid-gesture. The remainder is kept as-is.
    pub fn set_scroll_speed(&mut self, speed: f64) {
        self.threshold_px = threshold_for_speed(speed);
    }
}

// ---------------------------------------------------------------------------
// Gesture boundary
// ---------------------------------------------------------------------------

/// Debounce that ends a gesture after [`GESTURE_IDLE_TIMEOUT`] of silence.
#[derive(Debug, Clone)]
pub struct GestureBoundaryTimer {
    timer: SingleShotTimer,
    idle: Duration,
}

impl Default for GestureBoundaryTimer {
    fn default() -> Self {
        Self::new(GESTURE_IDLE_TIMEOUT)
    }
}

impl GestureBoundaryTimer {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            timer: SingleShotTimer::new(),
            idle,
        }
    }

    /// Restart the quiet-period countdown.
    pub fn record_activity(&mut self, now: Duration) {
        self.timer.arm(now, self.idle);
    }

    /// Returns `true` once when the gesture has ended.
    pub fn poll(&mut self, now: Duration) -> bool {
        self.timer.poll(now)
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }
}

// ---------------------------------------------------------------------------
// Per-pane wheel pipeline
// ---------------------------------------------------------------------------

/// Normalizer + accumulator + gesture timer for one pane.
#[derive(Debug, Clone, Default)]
pub struct WheelScroller {
    accumulator: ScrollAccumulator,
    gesture: GestureBoundaryTimer,
}

impl WheelScroller {
    #[must_use]
    pub fn new(scroll_speed: f64, gesture_idle: Duration) -> Self {
        Self {
            accumulator: ScrollAccumulator::new(scroll_speed),
            gesture: GestureBoundaryTimer::new(gesture_idle),
        }
    }

    /// Feed one wheel event, returning whole lines to scroll (may be `0`).
    ///
    /// A gesture that ended before `now` is closed first, so the event starts
    /// from a zero remainder even if the host has not ticked since.
    pub fn on_wheel(&mut self, wheel: WheelInput, now: Duration) -> i32 {
        if self.gesture.poll(now) {
            self.accumulator.reset();
            trace!("scroll gesture ended before next wheel event");
        }
        let px = normalize_delta(wheel.delta_y, wheel.delta_mode);
        let lines = self.accumulator.accumulate(px);
        self.gesture.record_activity(now);
        trace!(
            px,
            lines,
            remainder = self.accumulator.value(),
            "wheel accumulated"
        );
        lines
    }

    /// Advance the gesture timer. Returns `true` if the remainder was reset.
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.gesture.poll(now) {
            self.accumulator.reset();
            trace!("scroll gesture ended");
            true
        } else {
            false
        }
    }

    pub fn set_scroll_speed(&mut self, speed: f64) {
        self.accumulator.set_scroll_speed(speed);
    }

    #[must_use]
    pub fn accumulator(&self) -> &ScrollAccumulator {
        &self.accumulator
    }

    #[must_use]
    pub fn gesture_pending(&self) -> bool {
        self.gesture.is_pending()
    }

    /// Drop remainder and pending timer (pane teardown).
    pub fn clear(&mut self) {
        self.accumulator.reset();
        self.gesture.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
