#![forbid(unsafe_code)]

//! Host-completed folder pick.
//!
//! The native dialog runs in the backend. The UI thread records a ticket in
//! [`FolderPicker::begin`], keeps dispatching events, and later hands the
//! backend's answer to [`FolderPicker::complete`]. Every failure mode
//! (error, empty answer, superseded ticket) is folded into
//! [`PickOutcome::Declined`] and leaves no state behind.

use std::path::PathBuf;

use tracing::debug;

/// Error returned by the backend for a pick request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No dialog could be shown (headless host, permissions, ...).
    Unavailable,
    /// The backend reported a failure.
    Failed(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "backend dialog unavailable"),
            Self::Failed(msg) => write!(f, "backend call failed: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Identifies one outstanding pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Chosen(PathBuf),
    Declined,
}

/// Tracks at most one outstanding folder pick.
#[derive(Debug, Default)]
pub struct FolderPicker {
    next: u64,
    pending: Option<PickTicket>,
}

impl FolderPicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pick. Any earlier outstanding pick is superseded.
    pub fn begin(&mut self) -> PickTicket {
        let ticket = PickTicket(self.next);
        self.next += 1;
        if let Some(old) = self.pending.replace(ticket) {
            debug!(superseded = old.0, "folder pick superseded");
        }
        ticket
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve a pick with the backend's answer.
    pub fn complete(
        &mut self,
        ticket: PickTicket,
        result: Result<Option<PathBuf>, BackendError>,
    ) -> PickOutcome {
        if self.pending != Some(ticket) {
            debug!(ticket = ticket.0, "stale folder pick completion");
            return PickOutcome::Declined;
        }
        self.pending = None;
        match result {
            Ok(Some(path)) if !path.as_os_str().is_empty() => PickOutcome::Chosen(path),
            Ok(_) => PickOutcome::Declined,
            Err(err) => {
                debug!(%err, "folder pick failed; treating as declined");
                PickOutcome::Declined
            }
        }
    }
}
