#![forbid(unsafe_code)]

//! A window's worth of panes sharing one channel, active slot and clock.
//!
//! # Design
//!
//! [`PaneDeck`] is the host-facing entry point. The host forwards backend
//! events through [`PaneDeck::emit_backend`], device events through
//! [`PaneDeck::pane_mut`], and drives timers with [`PaneDeck::tick`] after
//! advancing its clock. Panes are keyed by session; at most one pane per
//! session is mounted at a time.
//!
//! # Invariants
//!
//! 1. Mounting a session that already has a pane unmounts the old pane
//!    first, so listener counts per topic equal the number of panes.
//! 2. Unmounting the active pane empties the active slot.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, debug_span, info};

use crate::clock::Clock;
use crate::config::PaneConfig;
use crate::events::{Payload, SessionId, global_paste_payload, topic};
use crate::pane::{Pane, PaneContext};
use crate::picker::{BackendError, FolderPicker, PickOutcome, PickTicket};
use crate::surface::TerminalSurface;

#[derive(Debug)]
pub struct PaneDeck {
    ctx: PaneContext,
    config: PaneConfig,
    panes: BTreeMap<SessionId, Pane>,
    picker: FolderPicker,
}

impl PaneDeck {
    #[must_use]
    pub fn new(config: PaneConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            ctx: PaneContext::new(clock),
            config,
            panes: BTreeMap::new(),
            picker: FolderPicker::new(),
        }
    }

    /// Mount a pane for `session`, replacing any existing one.
    pub fn mount(&mut self, session: SessionId, surface: Box<dyn TerminalSurface>) -> &mut Pane {
        if let Some(mut old) = self.panes.remove(&session) {
            debug!(session = %session, "replacing mounted pane");
            old.unmount();
        }
        let pane = Pane::mount(session.clone(), surface, &self.config, &self.ctx);
        info!(session = %session, panes = self.panes.len() + 1, "pane mounted");
        self.panes.entry(session).or_insert(pane)
    }

    /// Unmount and drop the pane for `session`. Returns `false` if none.
    pub fn unmount(&mut self, session: &SessionId) -> bool {
        match self.panes.remove(session) {
            Some(mut pane) => {
                pane.unmount();
                info!(session = %session, panes = self.panes.len(), "pane removed");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn pane(&self, session: &SessionId) -> Option<&Pane> {
        self.panes.get(session)
    }

    pub fn pane_mut(&mut self, session: &SessionId) -> Option<&mut Pane> {
        self.panes.get_mut(session)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &SessionId> {
        self.panes.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    /// Forward a backend event to every subscriber of `topic`.
    ///
    /// Returns the number of handlers invoked, including ones that filtered
    /// the payload out.
    pub fn emit_backend(&self, topic: &str, payload: &Payload) -> usize {
        let _span = debug_span!("deck.emit_backend", topic).entered();
        self.ctx.channel.emit(topic, payload)
    }

    /// Broadcast a menu or system paste to the active pane.
    pub fn dispatch_global_paste(&self, text: &str) -> usize {
        self.emit_backend(topic::GLOBAL_PASTE, &global_paste_payload(text))
    }

    /// Drive every pane's timers at the current clock time.
    ///
    /// Returns how many panes ended a scroll gesture.
    pub fn tick(&mut self) -> usize {
        self.panes.values_mut().map(Pane::tick).filter(|&ended| ended).count()
    }

    #[must_use]
    pub fn active(&self) -> Option<SessionId> {
        self.ctx.active.current()
    }

    #[must_use]
    pub fn context(&self) -> &PaneContext {
        &self.ctx
    }

    #[must_use]
    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    /// Apply a new scroll speed to the config and every mounted pane.
    pub fn set_scroll_speed(&mut self, speed: f64) {
        self.config.scroll_speed = speed;
        for pane in self.panes.values_mut() {
            pane.set_scroll_speed(speed);
        }
    }

    pub fn begin_folder_pick(&mut self) -> PickTicket {
        self.picker.begin()
    }

    pub fn complete_folder_pick(
        &mut self,
        ticket: PickTicket,
        result: Result<Option<PathBuf>, BackendError>,
    ) -> PickOutcome {
        self.picker.complete(ticket, result)
    }

    #[must_use]
    pub fn folder_pick_pending(&self) -> bool {
        self.picker.is_pending()
    }
}
