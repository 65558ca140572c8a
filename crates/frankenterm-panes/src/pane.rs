#![forbid(unsafe_code)]

//! One mounted terminal pane and its event handlers.
//!
//! # Design
//!
//! A [`Pane`] owns all per-pane state (wheel scroller, paste record, grace
//! guard, dispatch log) behind one `Rc<RefCell<..>>` that its channel
//! handlers share. Nothing in here is shared with sibling panes except the
//! [`PaneContext`]: the event channel, the active-pane slot and the clock.
//!
//! # Lifecycle
//!
//! ```text
//!   mount ──▶ subscribed(3) ──remount──▶ cancel all ──▶ subscribed(3)
//!                  │
//!                  └──unmount / drop──▶ cancel all, release active slot
//! ```
//!
//! # Failure Modes
//!
//! - Payloads for another session, missing fields, or undecodable bodies
//!   are dropped and recorded in the pane's [`PaneEventLog`]; sibling panes
//!   are never affected.
//! - A [`TerminalSurface`] that emits on the channel from inside a callback
//!   re-enters the pane while its state is borrowed. The nested event is
//!   dropped for that pane (logged at `debug`); the outer event and sibling
//!   panes are unaffected.

use core::time::Duration;
use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use tracing::{debug, debug_span, trace};

use crate::active_pane::ActivePane;
use crate::channel::{EventChannel, Subscription};
use crate::clock::Clock;
use crate::config::PaneConfig;
use crate::event_log::{LogOutcome, PaneEventLog, PaneLogEntry};
use crate::events::{GlobalPaste, InitialViewport, Payload, ResizeEpoch, SessionId, topic};
use crate::input::{KeyInput, Platform, WheelInput, is_paste_chord};
use crate::paste::PasteGuard;
use crate::resize_guard::{ClickMode, EpochUpdate, ResizeGraceGuard};
use crate::router::{IgnoredReason, session_filter};
use crate::scroll::WheelScroller;
use crate::surface::TerminalSurface;

/// Log label for pastes arriving through the keyboard shortcut path.
pub const LOCAL_PASTE: &str = "local-paste";

/// Collaborators shared by every pane in one window.
#[derive(Clone)]
pub struct PaneContext {
    pub channel: EventChannel<Payload>,
    pub active: ActivePane,
    pub clock: Rc<dyn Clock>,
}

impl PaneContext {
    #[must_use]
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            channel: EventChannel::new(),
            active: ActivePane::new(),
            clock,
        }
    }
}

impl std::fmt::Debug for PaneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneContext")
            .field("channel", &self.channel)
            .field("active", &self.active.current())
            .field("now", &self.clock.now_mono())
            .finish()
    }
}

/// What the host should do with a key event after the pane saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Paste chord: read the clipboard and call [`Pane::apply_local_paste`].
    Paste,
    /// Forward the key to the hosted process.
    Forward,
}

struct PaneState {
    surface: Box<dyn TerminalSurface>,
    scroller: WheelScroller,
    paste: PasteGuard,
    grace: ResizeGraceGuard,
    log: PaneEventLog,
}

impl PaneState {
    fn record(&mut self, topic: &'static str, now: Duration, outcome: LogOutcome) {
        self.log.push(PaneLogEntry {
            topic,
            at_ms: now.as_millis() as u64,
            outcome,
        });
    }

    fn apply_paste(&mut self, text: Option<&str>, now: Duration) -> bool {
        let Some(text) = text else {
            return false;
        };
        if !self.paste.admit(Some(text), now) {
            return false;
        }
        self.surface.paste(text);
        true
    }
}

/// Run `f` on the pane state unless it is already borrowed higher up the
/// stack, in which case the event is dropped.
fn with_state(state: &RefCell<PaneState>, topic: &'static str, f: impl FnOnce(&mut PaneState)) {
    match state.try_borrow_mut() {
        Ok(mut state) => f(&mut state),
        Err(_) => debug!(topic, "re-entrant event dropped"),
    }
}

/// A mounted terminal view bound to one backend session.
pub struct Pane {
    session: SessionId,
    state: Rc<RefCell<PaneState>>,
    ctx: PaneContext,
    platform: Platform,
    subscriptions: Vec<Subscription>,
    mounted: bool,
}

impl std::fmt::Debug for Pane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pane")
            .field("session", &self.session)
            .field("mounted", &self.mounted)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Pane {
    /// Create per-pane state and subscribe to the backend topics.
    pub fn mount(
        session: SessionId,
        surface: Box<dyn TerminalSurface>,
        config: &PaneConfig,
        ctx: &PaneContext,
    ) -> Self {
        let state = PaneState {
            surface,
            scroller: WheelScroller::new(config.scroll_speed, config.gesture_idle()),
            paste: PasteGuard::new(config.paste_dedup_window()),
            grace: ResizeGraceGuard::new(config.resize_grace(), config.alt_exit_grace()),
            log: PaneEventLog::default(),
        };
        let mut pane = Self {
            session,
            state: Rc::new(RefCell::new(state)),
            ctx: ctx.clone(),
            platform: config.platform,
            subscriptions: Vec::with_capacity(3),
            mounted: false,
        };
        pane.subscribe_all();
        debug!(session = %pane.session, "pane mounted");
        pane
    }

    /// Re-run subscription setup, cancelling every previous handle first.
    pub fn remount(&mut self) {
        let _span = debug_span!("pane.remount", session = %self.session).entered();
        self.cancel_subscriptions();
        self.subscribe_all();
    }

    /// Cancel all subscriptions and drop transient state. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.cancel_subscriptions();
        self.state.borrow_mut().scroller.clear();
        self.ctx.active.release(&self.session);
        self.mounted = false;
        debug!(session = %self.session, "pane unmounted");
    }

    fn cancel_subscriptions(&mut self) {
        for mut sub in self.subscriptions.drain(..) {
            sub.cancel();
        }
    }

    fn subscribe_all(&mut self) {
        let subs = [
            self.subscribe_initial_viewport(),
            self.subscribe_resize_epoch(),
            self.subscribe_global_paste(),
        ];
        self.subscriptions.extend(subs);
        self.mounted = true;
    }

    fn ignored_logger(&self, topic: &'static str) -> impl Fn(IgnoredReason) + 'static {
        let state = Rc::clone(&self.state);
        let clock = Rc::clone(&self.ctx.clock);
        move |reason| {
            with_state(&state, topic, |state| {
                state.record(topic, clock.now_mono(), LogOutcome::Ignored(reason));
            });
        }
    }

    fn subscribe_initial_viewport(&self) -> Subscription {
        let state = Rc::clone(&self.state);
        let clock = Rc::clone(&self.ctx.clock);
        let handler = move |payload: &Payload| {
            let now = clock.now_mono();
            with_state(&state, topic::INITIAL_VIEWPORT, |state| {
                let outcome = match InitialViewport::deserialize(payload) {
                    Ok(viewport) => {
                        state.surface.write(&viewport.data);
                        LogOutcome::Delivered
                    }
                    Err(err) => {
                        trace!(%err, "initial viewport did not decode");
                        LogOutcome::Ignored(IgnoredReason::Malformed)
                    }
                };
                state.record(topic::INITIAL_VIEWPORT, now, outcome);
            });
        };
        self.ctx.channel.subscribe(
            topic::INITIAL_VIEWPORT,
            session_filter(
                self.session.clone(),
                handler,
                self.ignored_logger(topic::INITIAL_VIEWPORT),
            ),
        )
    }

    fn subscribe_resize_epoch(&self) -> Subscription {
        let state = Rc::clone(&self.state);
        let clock = Rc::clone(&self.ctx.clock);
        let handler = move |payload: &Payload| {
            let now = clock.now_mono();
            with_state(&state, topic::RESIZE_EPOCH, |state| {
                let outcome = match ResizeEpoch::deserialize(payload) {
                    Ok(ev) => {
                        if let EpochUpdate::Rewound { previous } =
                            state.grace.on_resize_epoch(ev.epoch, now)
                        {
                            trace!(epoch = ev.epoch, previous, "resize epoch counter restarted");
                        }
                        LogOutcome::Delivered
                    }
                    Err(err) => {
                        trace!(%err, "resize epoch did not decode");
                        LogOutcome::Ignored(IgnoredReason::Malformed)
                    }
                };
                state.record(topic::RESIZE_EPOCH, now, outcome);
            });
        };
        self.ctx.channel.subscribe(
            topic::RESIZE_EPOCH,
            session_filter(
                self.session.clone(),
                handler,
                self.ignored_logger(topic::RESIZE_EPOCH),
            ),
        )
    }

    fn subscribe_global_paste(&self) -> Subscription {
        let state = Rc::clone(&self.state);
        let clock = Rc::clone(&self.ctx.clock);
        let active = self.ctx.active.clone();
        let session = self.session.clone();
        self.ctx
            .channel
            .subscribe(topic::GLOBAL_PASTE, move |payload: &Payload| {
                let now = clock.now_mono();
                with_state(&state, topic::GLOBAL_PASTE, |state| {
                    let outcome = if !active.is_recipient(&session) {
                        LogOutcome::Ignored(IgnoredReason::NotActivePane)
                    } else {
                        match GlobalPaste::deserialize(payload) {
                            Ok(ev) => {
                                if state.apply_paste(ev.text.as_deref(), now) {
                                    LogOutcome::Delivered
                                } else {
                                    LogOutcome::Suppressed
                                }
                            }
                            Err(_) => LogOutcome::Ignored(IgnoredReason::Malformed),
                        }
                    };
                    state.record(topic::GLOBAL_PASTE, now, outcome);
                });
            })
    }

    fn now(&self) -> Duration {
        self.ctx.clock.now_mono()
    }

    // -- Device input ------------------------------------------------------

    /// Feed a wheel event. Returns the lines scrolled on the surface.
    pub fn handle_wheel(&mut self, wheel: WheelInput) -> i32 {
        let now = self.now();
        let mut state = self.state.borrow_mut();
        let lines = state.scroller.on_wheel(wheel, now);
        if lines != 0 {
            state.surface.scroll_lines(lines);
        }
        lines
    }

    /// Typing marks this pane active; the paste chord is reported back.
    pub fn handle_key(&mut self, key: &KeyInput) -> KeyDisposition {
        self.ctx.active.activate(&self.session);
        if is_paste_chord(key, self.platform) {
            KeyDisposition::Paste
        } else {
            KeyDisposition::Forward
        }
    }

    /// Focus gain on the input surface marks this pane active.
    pub fn handle_focus(&mut self, focused: bool) {
        if focused {
            self.ctx.active.activate(&self.session);
        }
    }

    /// Apply clipboard text read by the host after [`KeyDisposition::Paste`].
    ///
    /// Shares the paste record with the global paste path, so the same text
    /// arriving through both is written once.
    pub fn apply_local_paste(&mut self, text: &str) -> bool {
        let now = self.now();
        let mut state = self.state.borrow_mut();
        let applied = state.apply_paste(Some(text), now);
        let outcome = if applied {
            LogOutcome::Delivered
        } else {
            LogOutcome::Suppressed
        };
        state.record(LOCAL_PASTE, now, outcome);
        applied
    }

    /// Feed the widget's alt-screen flag; leaving it opens a grace window.
    pub fn observe_alt_screen(&mut self, active: bool) -> bool {
        let now = self.now();
        self.state.borrow_mut().grace.observe_alt_screen(active, now)
    }

    pub fn on_alt_screen_exit(&mut self) {
        let now = self.now();
        self.state.borrow_mut().grace.on_alt_screen_exit(now);
    }

    /// How the next click should be treated.
    #[must_use]
    pub fn click_mode(&self, viewport_y: u32, base_y: u32) -> ClickMode {
        self.state
            .borrow()
            .grace
            .click_mode(viewport_y, base_y, self.now())
    }

    pub fn set_scroll_speed(&mut self, speed: f64) {
        self.state.borrow_mut().scroller.set_scroll_speed(speed);
    }

    /// Advance pane timers. Returns `true` if a scroll gesture ended.
    pub fn tick(&mut self) -> bool {
        let now = self.now();
        self.state.borrow_mut().scroller.tick(now)
    }

    // -- Accessors ---------------------------------------------------------

    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn resize_epoch(&self) -> Option<u64> {
        self.state.borrow().grace.epoch()
    }

    #[must_use]
    pub fn grace_until(&self) -> Option<Duration> {
        self.state.borrow().grace.grace_until()
    }

    #[must_use]
    pub fn scroll_remainder(&self) -> f64 {
        self.state.borrow().scroller.accumulator().value()
    }

    #[must_use]
    pub fn log_entries(&self) -> Vec<PaneLogEntry> {
        self.state.borrow().log.iter().cloned().collect()
    }

    #[must_use]
    pub fn log_count(&self, topic: &str, outcome: LogOutcome) -> usize {
        self.state.borrow().log.count(topic, outcome)
    }

    pub fn log_jsonl(&self) -> Result<String, serde_json::Error> {
        self.state.borrow().log.to_jsonl()
    }
}

impl Drop for Pane {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::HostClock;
    use crate::events::{global_paste_payload, resize_epoch_payload};
    use crate::input::Modifiers;
    use crate::surface::{RecordingSurface, SurfaceOp};
    use serde_json::json;

    fn setup() -> (HostClock, PaneContext) {
        let clock = HostClock::new();
        let ctx = PaneContext::new(Rc::new(clock.clone()));
        (clock, ctx)
    }

    fn mount(ctx: &PaneContext, id: &str) -> (Pane, RecordingSurface) {
        let surface = RecordingSurface::new();
        let config = PaneConfig {
            platform: Platform::MacOs,
            ..PaneConfig::default()
        };
        let pane = Pane::mount(
            SessionId::new(id),
            Box::new(surface.clone()),
            &config,
            ctx,
        );
        (pane, surface)
    }

    #[test]
    fn mount_subscribes_three_topics() {
        let (_clock, ctx) = setup();
        let (pane, _) = mount(&ctx, "a");
        assert_eq!(pane.subscription_count(), 3);
        assert_eq!(ctx.channel.handler_count(topic::INITIAL_VIEWPORT), 1);
        assert_eq!(ctx.channel.handler_count(topic::RESIZE_EPOCH), 1);
        assert_eq!(ctx.channel.handler_count(topic::GLOBAL_PASTE), 1);
    }

    #[test]
    fn remount_does_not_duplicate_handlers() {
        let (_clock, ctx) = setup();
        let (mut pane, surface) = mount(&ctx, "a");
        for _ in 0..5 {
            pane.remount();
        }
        assert_eq!(ctx.channel.handler_count(topic::INITIAL_VIEWPORT), 1);
        ctx.channel.emit(
            topic::INITIAL_VIEWPORT,
            &json!({ "sessionId": "a", "data": "x" }),
        );
        assert_eq!(surface.ops(), vec![SurfaceOp::Write("x".into())]);
    }

    #[test]
    fn unmount_is_idempotent_and_removes_handlers() {
        let (_clock, ctx) = setup();
        let (mut pane, _) = mount(&ctx, "a");
        pane.unmount();
        pane.unmount();
        assert!(!pane.is_mounted());
        assert_eq!(ctx.channel.topic_count(), 0);
    }

    #[test]
    fn initial_viewport_for_other_session_is_ignored() {
        let (_clock, ctx) = setup();
        let (pane, surface) = mount(&ctx, "a");
        ctx.channel.emit(
            topic::INITIAL_VIEWPORT,
            &json!({ "sessionId": "b", "data": "nope" }),
        );
        assert!(surface.ops().is_empty());
        assert_eq!(
            pane.log_count(
                topic::INITIAL_VIEWPORT,
                LogOutcome::Ignored(IgnoredReason::SessionMismatch)
            ),
            1
        );
    }

    #[test]
    fn malformed_viewport_is_logged_not_written() {
        let (_clock, ctx) = setup();
        let (pane, surface) = mount(&ctx, "a");
        ctx.channel
            .emit(topic::INITIAL_VIEWPORT, &json!({ "sessionId": "a", "data": 3 }));
        assert!(surface.ops().is_empty());
        assert_eq!(
            pane.log_count(
                topic::INITIAL_VIEWPORT,
                LogOutcome::Ignored(IgnoredReason::Malformed)
            ),
            1
        );
    }

    #[test]
    fn resize_epoch_sets_grace() {
        let (clock, ctx) = setup();
        let (pane, _) = mount(&ctx, "a");
        clock.advance_ms(1000);
        ctx.channel
            .emit(topic::RESIZE_EPOCH, &resize_epoch_payload(&SessionId::new("a"), 3));
        assert_eq!(pane.resize_epoch(), Some(3));
        assert_eq!(pane.grace_until(), Some(Duration::from_millis(1100)));
        assert_eq!(pane.click_mode(0, 0), ClickMode::NonCursor);
        clock.advance_ms(100);
        assert_eq!(pane.click_mode(0, 0), ClickMode::Cursor);
    }

    #[test]
    fn resize_epoch_for_other_session_changes_nothing() {
        let (clock, ctx) = setup();
        let (pane, _) = mount(&ctx, "a");
        clock.advance_ms(50);
        ctx.channel
            .emit(topic::RESIZE_EPOCH, &resize_epoch_payload(&SessionId::new("b"), 9));
        assert_eq!(pane.resize_epoch(), None);
        assert_eq!(pane.grace_until(), None);
    }

    #[test]
    fn key_activates_and_resolves_chord() {
        let (_clock, ctx) = setup();
        let (mut pane, _) = mount(&ctx, "a");
        assert_eq!(
            pane.handle_key(&KeyInput::new("v", Modifiers::META)),
            KeyDisposition::Paste
        );
        assert_eq!(
            pane.handle_key(&KeyInput::new("v", Modifiers::CTRL)),
            KeyDisposition::Forward
        );
        assert_eq!(ctx.active.current(), Some(SessionId::new("a")));
    }

    #[test]
    fn local_and_global_paste_deduplicate() {
        let (clock, ctx) = setup();
        let (mut pane, surface) = mount(&ctx, "a");
        pane.handle_focus(true);
        assert!(pane.apply_local_paste("echo hi"));
        clock.advance_ms(30);
        ctx.channel
            .emit(topic::GLOBAL_PASTE, &global_paste_payload("echo hi"));
        assert_eq!(surface.pastes(), vec!["echo hi".to_string()]);
        assert_eq!(pane.log_count(topic::GLOBAL_PASTE, LogOutcome::Suppressed), 1);
    }

    #[test]
    fn wheel_scrolls_surface_and_gesture_resets() {
        let (clock, ctx) = setup();
        let (mut pane, surface) = mount(&ctx, "a");
        assert_eq!(pane.handle_wheel(WheelInput::pixels(75.0)), 1);
        assert_eq!(surface.scrolled_lines(), 1);
        assert_eq!(pane.scroll_remainder(), 15.0);
        clock.advance_ms(150);
        assert!(pane.tick());
        assert_eq!(pane.scroll_remainder(), 0.0);
    }

    #[test]
    fn alt_screen_exit_forces_non_cursor_clicks() {
        let (clock, ctx) = setup();
        let (mut pane, _) = mount(&ctx, "a");
        pane.observe_alt_screen(true);
        clock.advance_ms(10);
        assert!(pane.observe_alt_screen(false));
        clock.advance_ms(499);
        assert_eq!(pane.click_mode(5, 5), ClickMode::NonCursor);
        clock.advance_ms(1);
        assert_eq!(pane.click_mode(5, 5), ClickMode::Cursor);
        assert_eq!(pane.click_mode(4, 5), ClickMode::NonCursor);
    }

    #[test]
    fn drop_releases_active_slot() {
        let (_clock, ctx) = setup();
        {
            let (mut pane, _) = mount(&ctx, "a");
            pane.handle_focus(true);
            assert_eq!(ctx.active.current(), Some(SessionId::new("a")));
        }
        assert_eq!(ctx.active.current(), None);
        assert_eq!(ctx.channel.topic_count(), 0);
    }

    /// Surface that answers every write by emitting a resize for its session.
    struct EchoResizeSurface {
        channel: EventChannel<Payload>,
        session: SessionId,
        writes: Rc<RefCell<Vec<String>>>,
    }

    impl TerminalSurface for EchoResizeSurface {
        fn write(&mut self, data: &str) {
            self.writes.borrow_mut().push(data.to_owned());
            self.channel
                .emit(topic::RESIZE_EPOCH, &resize_epoch_payload(&self.session, 1));
        }
        fn paste(&mut self, _text: &str) {}
        fn scroll_lines(&mut self, _lines: i32) {}
    }

    #[test]
    fn reentrant_surface_event_is_dropped_not_fatal() {
        let (_clock, ctx) = setup();
        let writes = Rc::new(RefCell::new(Vec::new()));
        let surface = EchoResizeSurface {
            channel: ctx.channel.clone(),
            session: SessionId::new("a"),
            writes: Rc::clone(&writes),
        };
        let a = Pane::mount(
            SessionId::new("a"),
            Box::new(surface),
            &PaneConfig::default(),
            &ctx,
        );
        let (b, b_surface) = mount(&ctx, "b");

        ctx.channel.emit(
            topic::INITIAL_VIEWPORT,
            &json!({ "sessionId": "a", "data": "x" }),
        );
        assert_eq!(*writes.borrow(), vec!["x".to_string()]);
        assert_eq!(a.resize_epoch(), None);
        assert_eq!(
            a.log_count(topic::INITIAL_VIEWPORT, LogOutcome::Delivered),
            1
        );
        assert_eq!(
            b.log_count(
                topic::RESIZE_EPOCH,
                LogOutcome::Ignored(IgnoredReason::SessionMismatch)
            ),
            1
        );

        // State is intact afterwards.
        ctx.channel
            .emit(topic::RESIZE_EPOCH, &resize_epoch_payload(&SessionId::new("a"), 2));
        assert_eq!(a.resize_epoch(), Some(2));
        ctx.channel.emit(
            topic::INITIAL_VIEWPORT,
            &json!({ "sessionId": "b", "data": "y" }),
        );
        assert_eq!(b_surface.ops(), vec![SurfaceOp::Write("y".into())]);
    }
}
