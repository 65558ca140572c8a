#![forbid(unsafe_code)]

//! Paste de-duplication.
//!
//! One logical paste can reach a pane twice: once through the keyboard
//! shortcut handler and once through the OS paste command. [`PasteGuard`]
//! remembers the last applied paste and rejects an identical one arriving
//! within [`PASTE_DEDUP_WINDOW`].

use core::time::Duration;

use tracing::debug;

/// Identical pastes closer together than this are treated as one.
pub const PASTE_DEDUP_WINDOW: Duration = Duration::from_millis(100);

/// Most recently applied paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteRecord {
    pub text: String,
    pub applied_at: Duration,
}

/// Per-pane paste de-duplication state.
#[derive(Debug, Clone)]
pub struct PasteGuard {
    last: Option<PasteRecord>,
    window: Duration,
}

impl Default for PasteGuard {
    fn default() -> Self {
        Self::new(PASTE_DEDUP_WINDOW)
    }
}

impl PasteGuard {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    /// Decide whether `text` should be applied at `now`.
    ///
    /// On `true` the record is updated and the caller must perform the write.
    /// On `false` nothing changes.
    pub fn admit(&mut self, text: Option<&str>, now: Duration) -> bool {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return false;
        };
        if let Some(last) = &self.last
            && last.text == text
            && now.saturating_sub(last.applied_at) < self.window
        {
            debug!(
                len = text.len(),
                since_ms = now.saturating_sub(last.applied_at).as_millis() as u64,
                "duplicate paste suppressed"
            );
            return false;
        }
        self.last = Some(PasteRecord {
            text: text.to_owned(),
            applied_at: now,
        });
        true
    }

    #[must_use]
    pub fn last(&self) -> Option<&PasteRecord> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
