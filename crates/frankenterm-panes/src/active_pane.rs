#![forbid(unsafe_code)]

//! Which pane last received user interaction.
//!
//! [`ActivePane`] is a single shared slot. Clones are handles to the same
//! slot, injected into every pane's handlers; there is no global.
//!
//! # Invariants
//!
//! 1. Empty slot: every pane is a recipient of pane-agnostic actions.
//! 2. Non-empty slot: exactly the named pane is a recipient.
//! 3. Writes are last-writer-wins. All writes happen on the UI thread, so two
//!    activations in one tick resolve to whichever ran second.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::events::SessionId;

#[derive(Debug, Clone, Default)]
pub struct ActivePane {
    slot: Rc<RefCell<Option<SessionId>>>,
}

impl ActivePane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the slot at `session`.
    pub fn activate(&self, session: &SessionId) {
        let mut slot = self.slot.borrow_mut();
        if slot.as_ref() != Some(session) {
            debug!(session = %session, "active pane changed");
            *slot = Some(session.clone());
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<SessionId> {
        self.slot.borrow().clone()
    }

    /// Whether `session` should receive a pane-agnostic action.
    #[must_use]
    pub fn is_recipient(&self, session: &SessionId) -> bool {
        match &*self.slot.borrow() {
            None => true,
            Some(active) => active == session,
        }
    }

    /// Empty the slot if it still names `session`.
    ///
    /// Returns `true` if the slot was cleared.
    pub fn release(&self, session: &SessionId) -> bool {
        let mut slot = self.slot.borrow_mut();
        if slot.as_ref() == Some(session) {
            *slot = None;
            debug!(session = %session, "active pane released");
            true
        } else {
            false
        }
    }
}
